//! Cross-block resolution.
//!
//! Each worker first gathers a lookup table from the whole corpus and then
//! applies it to every block. Workers run one after the other in a fixed
//! order because later ones read what earlier ones resolved.

pub mod define_merge;
pub mod group;
pub mod name;
pub mod title;

use crate::error::{Error, Result};
use crate::parser::{BlockData, ParsedFile};
use crate::version;
use indexmap::IndexMap;
use log::{debug, info};
use serde_json::Value;
use std::path::Path;

/// Run-wide defaults the workers fall back to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDefaults {
    /// Version assumed for blocks without `@apiVersion`
    pub default_version: String,
}

impl Default for PackageDefaults {
    fn default() -> Self {
        Self {
            default_version: "0.0.0".to_string(),
        }
    }
}

impl PackageDefaults {
    /// Version of a block, falling back to the default version.
    pub fn version_of<'a>(&'a self, block: &'a BlockData) -> &'a str {
        block.version().unwrap_or(&self.default_version)
    }
}

/// Definitions by name, then by version, in the order they were found.
pub type DefineTable = IndexMap<String, IndexMap<String, Value>>;

/// Two-phase resolution step.
pub trait Worker {
    fn name(&self) -> &str;

    /// Builds the lookup table from the whole corpus. Runs before any `post_process`.
    fn pre_process(&self, _files: &[ParsedFile], _defaults: &PackageDefaults) -> DefineTable {
        DefineTable::new()
    }

    /// Applies the table to every block.
    fn post_process(&self, files: &mut [ParsedFile], table: &DefineTable, defaults: &PackageDefaults) -> Result<()>;
}

/// Ordered list of workers.
pub struct WorkerPipeline {
    workers: Vec<Box<dyn Worker>>,
}

impl WorkerPipeline {
    /// Built-in workers: definition use, the three structure references,
    /// group titles, the four field group titles and finally default names.
    pub fn new() -> Self {
        use crate::parsers::param::FieldKind;
        use define_merge::DefinitionMergeWorker;

        let mut workers: Vec<Box<dyn Worker>> = vec![
            Box::new(DefinitionMergeWorker::api_use()),
            Box::new(DefinitionMergeWorker::error_structure()),
            Box::new(DefinitionMergeWorker::header_structure()),
            Box::new(DefinitionMergeWorker::success_structure()),
            Box::new(group::GroupWorker),
        ];
        for kind in [FieldKind::Parameter, FieldKind::Header, FieldKind::Success, FieldKind::Error] {
            workers.push(Box::new(title::FieldTitleWorker::new(kind)));
        }
        workers.push(Box::new(name::NameWorker));

        Self { workers }
    }

    /// Appends a worker; it runs after the built-in ones.
    pub fn add_worker(&mut self, worker: Box<dyn Worker>) {
        self.workers.push(worker);
    }

    pub fn worker_names(&self) -> Vec<&str> {
        self.workers.iter().map(|w| w.name()).collect()
    }

    /// Runs gather then apply for each worker in order; the first failure aborts.
    pub fn process(&self, files: &mut [ParsedFile], defaults: &PackageDefaults) -> Result<()> {
        for worker in &self.workers {
            debug!("worker preProcess: {}", worker.name());
            let table = worker.pre_process(files, defaults);
            debug!("worker postProcess: {}", worker.name());
            worker.post_process(files, &table, defaults)?;
        }
        info!("resolved {} workers", self.workers.len());
        Ok(())
    }
}

impl Default for WorkerPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Diagnostic texts of a worker.
#[derive(Debug, Clone, Copy)]
pub struct Messages {
    pub element: &'static str,
    pub usage: &'static str,
    pub example: &'static str,
}

/// Indexes every block holding `global.<source>`, storing what `pick` returns
/// for it under its name and version.
pub(crate) fn gather<F>(files: &[ParsedFile], source: &str, defaults: &PackageDefaults, pick: F) -> DefineTable
where
    F: Fn(&BlockData, &Value) -> Value,
{
    let mut table = DefineTable::new();
    for block in files.iter().flat_map(|f| f.blocks.iter()) {
        let definition = match block.global.get(source) {
            Some(definition) => definition,
            None => continue,
        };
        let name = definition.get("name").and_then(Value::as_str).unwrap_or_default();
        let version = defaults.version_of(block);
        table
            .entry(name.to_string())
            .or_default()
            .insert(version.to_string(), pick(block, definition));
    }
    table
}

/// Outcome of a name and version lookup.
pub(crate) enum Lookup<'a> {
    Found(&'a Value),
    UnknownName,
    NoVersion(Vec<String>),
}

pub(crate) fn lookup<'a>(table: &'a DefineTable, name: &str, requested: &str, defaults: &PackageDefaults) -> Lookup<'a> {
    let versions = match table.get(name) {
        Some(versions) => versions,
        None => return Lookup::UnknownName,
    };
    match version::resolve(versions.keys().map(String::as_str), requested, &defaults.default_version) {
        Some(found) => Lookup::Found(&versions[found]),
        None => Lookup::NoVersion(versions.keys().cloned().collect()),
    }
}

pub(crate) fn unknown_name_error(file: &Path, block: usize, messages: &Messages, name: &str) -> Error {
    Error::CrossReference {
        message: "Referenced group name does not exist / it is not defined with @apiDefine.".to_string(),
        file: file.to_path_buf(),
        block,
        element: messages.element.to_string(),
        usage: messages.usage.to_string(),
        example: messages.example.to_string(),
        extra: vec![("Groupname".to_string(), name.to_string())],
    }
}

pub(crate) fn version_error(
    file: &Path,
    block: usize,
    messages: &Messages,
    name: &str,
    version: &str,
    defined: &[String],
) -> Error {
    Error::CrossReference {
        message: "Referenced definition has no matching or a higher version. \
                  Check version number in referenced define block."
            .to_string(),
        file: file.to_path_buf(),
        block,
        element: messages.element.to_string(),
        usage: messages.usage.to_string(),
        example: messages.example.to_string(),
        extra: vec![
            ("Groupname".to_string(), name.to_string()),
            ("Version".to_string(), version.to_string()),
            ("Defined versions".to_string(), defined.join(", ")),
        ],
    }
}
