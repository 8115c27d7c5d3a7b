use super::{gather, lookup, version_error, DefineTable, Lookup, Messages, PackageDefaults, Worker};
use crate::error::Result;
use crate::parser::ParsedFile;
use crate::text::replace_non_word;
use serde_json::Value;
use std::env;

const MESSAGES: Messages = Messages {
    element: "apiGroup",
    usage: "@apiGroup group",
    example: "@apiDefine MyValidGroup Some title\n@apiGroup MyValidGroup",
};

/// Assigns every endpoint a group and copies the group's title and description.
///
/// Blocks without `@apiGroup` are grouped by their file's absolute path. The
/// group name is sanitized to word characters. A group without a matching
/// `@apiDefine` uses its own name as title.
pub struct GroupWorker;

impl Worker for GroupWorker {
    fn name(&self) -> &str {
        "apiGroup"
    }

    fn pre_process(&self, files: &[ParsedFile], defaults: &PackageDefaults) -> DefineTable {
        gather(files, "define", defaults, |_, definition| definition.clone())
    }

    fn post_process(&self, files: &mut [ParsedFile], table: &DefineTable, defaults: &PackageDefaults) -> Result<()> {
        let cwd = env::current_dir()?;

        for file in files.iter_mut() {
            for block in file.blocks.iter_mut() {
                if !block.global.is_empty() {
                    continue;
                }
                let group = match block.local.get("group").and_then(Value::as_str) {
                    Some(group) if !group.is_empty() => group.to_string(),
                    _ => cwd.join(&file.path).to_string_lossy().into_owned(),
                };
                block.local.insert("group".to_string(), Value::String(replace_non_word(&group)));
            }
        }

        for file in files.iter_mut() {
            for block in file.blocks.iter_mut() {
                let name = match block.local.get("group").and_then(Value::as_str) {
                    Some(name) => name.to_string(),
                    None => continue,
                };
                let version = defaults.version_of(block).to_string();

                let (title, description) = match lookup(table, &name, &version, defaults) {
                    Lookup::Found(definition) => (
                        definition.get("title").cloned().unwrap_or(Value::Null),
                        definition.get("description").cloned(),
                    ),
                    Lookup::UnknownName => (Value::String(name.clone()), None),
                    Lookup::NoVersion(defined) => {
                        return Err(version_error(&file.path, block.index, &MESSAGES, &name, &version, &defined))
                    }
                };

                block.local.insert("groupTitle".to_string(), title);
                if let Some(description) = description.filter(|d| d.as_str().map_or(false, |s| !s.is_empty())) {
                    block.local.insert("groupDescription".to_string(), description);
                }
            }
        }
        Ok(())
    }
}
