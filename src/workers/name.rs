use super::{DefineTable, PackageDefaults, Worker};
use crate::error::Result;
use crate::parser::ParsedFile;
use crate::text::{replace_non_word, upper_first};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static WORD_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());

/// Gives every endpoint a name, deriving one from verb and URL when `@apiName`
/// is missing.
pub struct NameWorker;

/// `get` and `/users/:id` become `GetUsersId`.
pub fn derive_name(verb: &str, url: &str) -> String {
    let mut name = upper_first(verb);
    for part in WORD_RUN.find_iter(url) {
        name.push_str(&upper_first(part.as_str()));
    }
    name
}

impl Worker for NameWorker {
    fn name(&self) -> &str {
        "apiName"
    }

    fn post_process(&self, files: &mut [ParsedFile], _table: &DefineTable, _defaults: &PackageDefaults) -> Result<()> {
        for block in files.iter_mut().flat_map(|f| f.blocks.iter_mut()) {
            if !block.global.is_empty() {
                continue;
            }
            let name = match block.local.get("name").and_then(Value::as_str) {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => {
                    let verb = block.local.get("type").and_then(Value::as_str).unwrap_or_default();
                    let url = block.local.get("url").and_then(Value::as_str).unwrap_or_default();
                    derive_name(verb, url)
                }
            };
            block.local.insert("name".to_string(), Value::String(replace_non_word(&name)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{block, file};
    use super::*;
    use serde_json::json;

    fn run(files: &mut [ParsedFile]) {
        NameWorker
            .post_process(files, &DefineTable::new(), &PackageDefaults::default())
            .unwrap();
    }

    #[test]
    fn test_derive_name() {
        assert_eq!(derive_name("get", "/users/:id"), "GetUsersId");
        assert_eq!(derive_name("post", "/v1/user_profiles"), "PostV1User_profiles");
        assert_eq!(derive_name("", "/"), "");
    }

    #[test]
    fn test_missing_name_is_derived() {
        let mut files = vec![file("a.js", vec![block(json!({}), json!({"type": "put", "url": "/users/:id/avatar"}))])];
        run(&mut files);
        assert_eq!(files[0].blocks[0].local["name"], "PutUsersIdAvatar");
    }

    #[test]
    fn test_explicit_name_is_sanitized() {
        let mut files = vec![file("a.js", vec![block(json!({}), json!({"name": "Get-User by.id"}))])];
        run(&mut files);
        assert_eq!(files[0].blocks[0].local["name"], "Get_User_by_id");
    }

    #[test]
    fn test_definition_blocks_are_skipped() {
        let mut files = vec![file("a.js", vec![block(json!({"define": {"name": "X"}}), json!({}))])];
        run(&mut files);
        assert!(!files[0].blocks[0].local.contains_key("name"));
    }
}
