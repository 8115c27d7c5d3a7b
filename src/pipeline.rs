//! End-to-end generation: parse, filter, resolve, synthesize.

use crate::error::Result;
use crate::filter::{endpoint_records, FilterStage};
use crate::info::PackageInfo;
use crate::openapi_builder::{build_document, OpenApiDocument};
use crate::parser::{AnnotationParser, ParseOptions};
use crate::scanner::SourceUnit;
use crate::workers::{PackageDefaults, WorkerPipeline};
use log::info;
use serde_json::Value;

/// The configured stages of one generation run.
///
/// Each stage can be extended before running: register languages, tag
/// parsers and element hooks on [`Pipeline::parser_mut`], post-filters on
/// [`Pipeline::filters_mut`] and workers on [`Pipeline::workers_mut`].
pub struct Pipeline {
    parser: AnnotationParser,
    filters: FilterStage,
    workers: WorkerPipeline,
    defaults: PackageDefaults,
}

impl Pipeline {
    pub fn new(options: ParseOptions, defaults: PackageDefaults) -> Self {
        Self {
            parser: AnnotationParser::new(options),
            filters: FilterStage::new(),
            workers: WorkerPipeline::new(),
            defaults,
        }
    }

    pub fn parser_mut(&mut self) -> &mut AnnotationParser {
        &mut self.parser
    }

    pub fn filters_mut(&mut self) -> &mut FilterStage {
        &mut self.filters
    }

    pub fn workers_mut(&mut self) -> &mut WorkerPipeline {
        &mut self.workers
    }

    /// Runs parsing, filtering and cross-block resolution and returns the
    /// resolved endpoint records in source order.
    ///
    /// # Errors
    ///
    /// Fails on the first element parsing or cross-reference error.
    pub fn endpoints(&mut self, units: &[SourceUnit]) -> Result<Vec<Value>> {
        let mut files = self.parser.parse_sources(units)?;
        info!("Parsed {} documented files", files.len());

        let selection = self.filters.process(&mut files);
        self.workers.process(&mut files, &self.defaults)?;

        let records = endpoint_records(&files, &selection);
        info!("Resolved {} endpoints", records.len());
        Ok(records)
    }

    /// Generates the OpenAPI document for `units`.
    pub fn generate(&mut self, units: &[SourceUnit], package: &PackageInfo) -> Result<OpenApiDocument> {
        let records = self.endpoints(units)?;
        build_document(&records, package.to_info())
    }
}
