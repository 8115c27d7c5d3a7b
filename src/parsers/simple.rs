//! Single-value tags stored directly on the endpoint record.

use super::{values_of, AttachMethod, FieldParser, ParseContext, Values};
use crate::error::ParameterError;
use crate::text::{underscore_whitespace, unindent};
use crate::version;
use serde_json::{json, Value};

/// `@apiDescription text`
pub struct DescriptionParser;

impl FieldParser for DescriptionParser {
    fn parse(&self, content: &str, _source: &str, _ctx: &mut ParseContext) -> Result<Option<Values>, ParameterError> {
        let description = content.trim();
        if description.is_empty() {
            return Ok(None);
        }
        Ok(Some(values_of("description", unindent(description))))
    }

    fn path(&self, _ctx: &ParseContext) -> String {
        "local".to_string()
    }

    fn method(&self) -> AttachMethod {
        AttachMethod::Insert
    }

    fn markdown_fields(&self) -> &[&'static str] {
        &["description"]
    }
}

/// `@apiDeprecated [text]`
pub struct DeprecatedParser;

impl FieldParser for DeprecatedParser {
    fn parse(&self, content: &str, _source: &str, _ctx: &mut ParseContext) -> Result<Option<Values>, ParameterError> {
        if content.is_empty() {
            return Ok(Some(values_of("deprecated", true)));
        }
        Ok(Some(values_of("deprecated", json!({ "content": unindent(content) }))))
    }

    fn path(&self, _ctx: &ParseContext) -> String {
        "local".to_string()
    }

    fn method(&self) -> AttachMethod {
        AttachMethod::Insert
    }

    fn markdown_fields(&self) -> &[&'static str] {
        &["deprecated.content"]
    }

    fn markdown_remove_p_tags(&self) -> &[&'static str] {
        &["deprecated.content"]
    }
}

/// `@apiGroup name`, whitespace runs become `_`.
pub struct GroupParser;

impl FieldParser for GroupParser {
    fn parse(&self, content: &str, _source: &str, _ctx: &mut ParseContext) -> Result<Option<Values>, ParameterError> {
        if content.is_empty() {
            return Ok(None);
        }
        Ok(Some(values_of("group", underscore_whitespace(content))))
    }

    fn path(&self, _ctx: &ParseContext) -> String {
        "local".to_string()
    }

    fn method(&self) -> AttachMethod {
        AttachMethod::Insert
    }
}

/// `@apiName name`, whitespace runs become `_`.
pub struct NameParser;

impl FieldParser for NameParser {
    fn parse(&self, content: &str, _source: &str, _ctx: &mut ParseContext) -> Result<Option<Values>, ParameterError> {
        if content.is_empty() {
            return Ok(None);
        }
        Ok(Some(values_of("name", underscore_whitespace(content))))
    }

    fn path(&self, _ctx: &ParseContext) -> String {
        "local".to_string()
    }

    fn method(&self) -> AttachMethod {
        AttachMethod::Insert
    }
}

/// `@apiUse name`
pub struct UseParser;

impl FieldParser for UseParser {
    fn parse(&self, content: &str, _source: &str, _ctx: &mut ParseContext) -> Result<Option<Values>, ParameterError> {
        parse_reference(content)
    }

    fn path(&self, _ctx: &ParseContext) -> String {
        "local.use".to_string()
    }

    fn prevent_global(&self) -> bool {
        true
    }
}

fn parse_reference(content: &str) -> Result<Option<Values>, ParameterError> {
    if content.is_empty() {
        return Ok(None);
    }
    Ok(Some(values_of("name", content)))
}

/// `@apiVersion major.minor.patch`
pub struct VersionParser;

impl FieldParser for VersionParser {
    fn parse(&self, content: &str, _source: &str, _ctx: &mut ParseContext) -> Result<Option<Values>, ParameterError> {
        if content.is_empty() {
            return Ok(None);
        }
        if version::parse(content).is_none() {
            return Err(ParameterError::new(
                "Version format not valid.",
                "apiVersion",
                "@apiVersion major.minor.patch",
                "@apiVersion 1.2.3",
            ));
        }
        Ok(Some(values_of("version", content)))
    }

    fn path(&self, _ctx: &ParseContext) -> String {
        "local".to_string()
    }

    fn method(&self) -> AttachMethod {
        AttachMethod::Insert
    }

    fn extend_root(&self) -> bool {
        true
    }
}

/// `@apiPrivate`
pub struct PrivateParser;

impl FieldParser for PrivateParser {
    fn parse(&self, _content: &str, _source: &str, _ctx: &mut ParseContext) -> Result<Option<Values>, ParameterError> {
        Ok(Some(values_of("private", Value::Bool(true))))
    }

    fn path(&self, _ctx: &ParseContext) -> String {
        "local".to_string()
    }

    fn method(&self) -> AttachMethod {
        AttachMethod::Insert
    }
}

/// Which structure a structure reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureKind {
    Error,
    Header,
    Success,
}

impl StructureKind {
    /// Key under `local` holding the references.
    pub fn target(self) -> &'static str {
        match self {
            StructureKind::Error => "errorStructure",
            StructureKind::Header => "headerStructure",
            StructureKind::Success => "successStructure",
        }
    }
}

/// `@apiErrorStructure name` and friends; superseded by `@apiUse`.
pub struct StructureUseParser {
    kind: StructureKind,
}

impl StructureUseParser {
    pub fn new(kind: StructureKind) -> Self {
        Self { kind }
    }
}

impl FieldParser for StructureUseParser {
    fn parse(&self, content: &str, _source: &str, _ctx: &mut ParseContext) -> Result<Option<Values>, ParameterError> {
        parse_reference(content)
    }

    fn path(&self, _ctx: &ParseContext) -> String {
        format!("local.{}", self.kind.target())
    }

    fn prevent_global(&self) -> bool {
        true
    }

    fn deprecated(&self) -> bool {
        true
    }

    fn alternative(&self) -> Option<&'static str> {
        Some("@apiUse")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(parser: &dyn FieldParser, content: &str) -> Result<Option<Values>, ParameterError> {
        parser.parse(content, "", &mut ParseContext::default())
    }

    #[test]
    fn test_group_and_name_replace_whitespace() {
        let values = parse(&GroupParser, "User Accounts").unwrap().unwrap();
        assert_eq!(values["group"], "User_Accounts");

        let values = parse(&NameParser, "Get  User").unwrap().unwrap();
        assert_eq!(values["name"], "Get_User");
    }

    #[test]
    fn test_empty_values_yield_nothing() {
        assert!(parse(&GroupParser, "").unwrap().is_none());
        assert!(parse(&NameParser, "").unwrap().is_none());
        assert!(parse(&UseParser, "").unwrap().is_none());
        assert!(parse(&DescriptionParser, "  ").unwrap().is_none());
    }

    #[test]
    fn test_deprecated_with_and_without_text() {
        let values = parse(&DeprecatedParser, "").unwrap().unwrap();
        assert_eq!(values["deprecated"], true);

        let values = parse(&DeprecatedParser, "use (#User:GetUser) now").unwrap().unwrap();
        assert_eq!(values["deprecated"]["content"], "use (#User:GetUser) now");
    }

    #[test]
    fn test_version_is_validated() {
        let values = parse(&VersionParser, "1.2.3").unwrap().unwrap();
        assert_eq!(values["version"], "1.2.3");
        assert!(VersionParser.extend_root());

        let err = parse(&VersionParser, "1.2").unwrap_err();
        assert_eq!(err.message, "Version format not valid.");
        assert_eq!(err.usage, "@apiVersion major.minor.patch");
    }

    #[test]
    fn test_use_pushes_reference() {
        let values = parse(&UseParser, "CommonHeaders").unwrap().unwrap();
        assert_eq!(values["name"], "CommonHeaders");
        assert_eq!(UseParser.method(), AttachMethod::Push);
        assert!(UseParser.prevent_global());
    }

    #[test]
    fn test_structure_reference_is_deprecated() {
        let parser = StructureUseParser::new(StructureKind::Success);
        let values = parse(&parser, "UserStructure").unwrap().unwrap();

        assert_eq!(values["name"], "UserStructure");
        assert_eq!(parser.path(&ParseContext::default()), "local.successStructure");
        assert_eq!(parser.alternative(), Some("@apiUse"));
    }
}
