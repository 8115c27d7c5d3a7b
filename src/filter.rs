use crate::parser::ParsedFile;
use crate::parsers::param::FieldKind;
use log::debug;
use serde_json::Value;
use std::collections::HashSet;

/// Corpus-wide cleanup run after parsing.
pub trait PostFilter {
    fn name(&self) -> &str;

    fn post_filter(&self, files: &mut [ParsedFile]);
}

/// Drops repeated field declarations (same `field`) inside each group of one section.
pub struct DuplicateFieldFilter {
    kind: FieldKind,
}

impl DuplicateFieldFilter {
    pub fn new(kind: FieldKind) -> Self {
        Self { kind }
    }
}

impl PostFilter for DuplicateFieldFilter {
    fn name(&self) -> &str {
        self.kind.tag()
    }

    fn post_filter(&self, files: &mut [ParsedFile]) {
        for block in files.iter_mut().flat_map(|f| f.blocks.iter_mut()) {
            let groups = match block
                .local
                .get_mut(self.kind.section())
                .and_then(|section| section.get_mut("fields"))
                .and_then(Value::as_object_mut)
            {
                Some(groups) => groups,
                None => continue,
            };

            for fields in groups.values_mut() {
                if let Value::Array(items) = fields {
                    let mut seen = HashSet::new();
                    items.retain(|item| {
                        let key = item.get("field").and_then(Value::as_str).unwrap_or_default().to_string();
                        seen.insert(key)
                    });
                }
            }
        }
    }
}

/// Position of an endpoint block: file index and block index within the file.
pub type BlockRef = (usize, usize);

/// Runs the post-filters and selects the endpoint blocks.
pub struct FilterStage {
    filters: Vec<Box<dyn PostFilter>>,
}

impl FilterStage {
    /// Stage with the duplicate-field filters for all four field sections.
    pub fn new() -> Self {
        let filters = FieldKind::ALL
            .iter()
            .map(|kind| Box::new(DuplicateFieldFilter::new(*kind)) as Box<dyn PostFilter>)
            .collect();
        Self { filters }
    }

    pub fn add_filter(&mut self, filter: Box<dyn PostFilter>) {
        self.filters.push(filter);
    }

    /// Applies every filter in registration order, then returns the blocks
    /// with an empty `global` and a non-empty `local` namespace.
    ///
    /// The selection is positional so it can be read after the workers
    /// have resolved the blocks.
    pub fn process(&self, files: &mut [ParsedFile]) -> Vec<BlockRef> {
        for filter in &self.filters {
            debug!("filter postFilter: {}", filter.name());
            filter.post_filter(files);
        }

        files
            .iter()
            .enumerate()
            .flat_map(|(file_index, file)| {
                file.blocks
                    .iter()
                    .enumerate()
                    .filter(|(_, block)| block.global.is_empty() && !block.local.is_empty())
                    .map(move |(block_index, _)| (file_index, block_index))
            })
            .collect()
    }
}

impl Default for FilterStage {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads the selected blocks' `local` records.
pub fn endpoint_records(files: &[ParsedFile], selection: &[BlockRef]) -> Vec<Value> {
    selection
        .iter()
        .filter_map(|&(file_index, block_index)| files.get(file_index)?.blocks.get(block_index))
        .map(|block| Value::Object(block.local.clone()))
        .collect()
}
