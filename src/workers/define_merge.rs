use super::{gather, lookup, unknown_name_error, version_error, DefineTable, Lookup, Messages, PackageDefaults, Worker};
use crate::error::Result;
use crate::merge::merge_into;
use crate::parser::ParsedFile;
use log::debug;
use serde_json::Value;
use std::collections::{HashSet, VecDeque};

/// Merges the endpoint data of a named definition into every block referencing it.
///
/// Definitions are the `local` data of blocks holding `global.<source>`;
/// references are the `{name}` entries in `local.<target>`. The reference list
/// is consumed.
pub struct DefinitionMergeWorker {
    name: &'static str,
    source: &'static str,
    target: &'static str,
    messages: Messages,
}

impl DefinitionMergeWorker {
    /// `@apiUse` referencing `@apiDefine`.
    pub fn api_use() -> Self {
        Self {
            name: "apiUse",
            source: "define",
            target: "use",
            messages: Messages {
                element: "apiUse",
                usage: "@apiUse group",
                example: "@apiDefine MyValidGroup Some title\n@apiUse MyValidGroup",
            },
        }
    }

    pub fn error_structure() -> Self {
        Self {
            name: "apiErrorStructure",
            source: "defineErrorStructure",
            target: "errorStructure",
            messages: Messages {
                element: "apiErrorStructure",
                usage: "@apiErrorStructure group",
                example: "@apiDefine MyValidErrorStructureGroup Some title\n@apiErrorStructure MyValidErrorStructureGroup",
            },
        }
    }

    pub fn header_structure() -> Self {
        Self {
            name: "apiHeaderStructure",
            source: "defineHeaderStructure",
            target: "headerStructure",
            messages: Messages {
                element: "apiHeaderStructure",
                usage: "@apiHeaderStructure group",
                example: "@apiDefine MyValidHeaderStructureGroup Some title\n@apiHeaderStructure MyValidHeaderStructureGroup",
            },
        }
    }

    pub fn success_structure() -> Self {
        Self {
            name: "apiSuccessStructure",
            source: "defineSuccessStructure",
            target: "successStructure",
            messages: Messages {
                element: "apiSuccessStructure",
                usage: "@apiSuccessStructure group",
                example: "@apiDefine MyValidSuccessStructureGroup Some title\n@apiSuccessStructure MyValidSuccessStructureGroup",
            },
        }
    }
}

fn reference_names(value: Option<Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.get("name").and_then(Value::as_str))
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

impl Worker for DefinitionMergeWorker {
    fn name(&self) -> &str {
        self.name
    }

    fn pre_process(&self, files: &[ParsedFile], defaults: &PackageDefaults) -> DefineTable {
        gather(files, self.source, defaults, |block, _| Value::Object(block.local.clone()))
    }

    fn post_process(&self, files: &mut [ParsedFile], table: &DefineTable, defaults: &PackageDefaults) -> Result<()> {
        for file in files.iter_mut() {
            for block in file.blocks.iter_mut() {
                if !block.local.contains_key(self.target) {
                    continue;
                }
                let version = defaults.version_of(block).to_string();

                let mut pending: VecDeque<String> = reference_names(block.local.remove(self.target)).into();
                let mut merged = HashSet::new();

                while let Some(name) = pending.pop_front() {
                    if !merged.insert(name.clone()) {
                        continue;
                    }
                    let data = match lookup(table, &name, &version, defaults) {
                        Lookup::Found(data) => data,
                        Lookup::UnknownName => {
                            return Err(unknown_name_error(&file.path, block.index, &self.messages, &name))
                        }
                        Lookup::NoVersion(defined) => {
                            return Err(version_error(&file.path, block.index, &self.messages, &name, &version, &defined))
                        }
                    };
                    debug!("{}: merge {} into block {} of {}", self.name, name, block.index, file.path.display());

                    if let Value::Object(data) = data {
                        merge_into(&mut block.local, data);
                    }
                    pending.extend(reference_names(block.local.remove(self.target)));
                }
            }
        }
        Ok(())
    }
}
