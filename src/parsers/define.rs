use super::{AttachMethod, FieldParser, ParseContext, Values};
use crate::error::ParameterError;
use crate::text::{is_word_char, unindent};
use serde_json::Value;

/// Which definition table a define tag writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefineKind {
    Define,
    ErrorStructure,
    HeaderStructure,
    SuccessStructure,
}

impl DefineKind {
    /// Key under `global` holding the definition.
    pub fn target(self) -> &'static str {
        match self {
            DefineKind::Define => "define",
            DefineKind::ErrorStructure => "defineErrorStructure",
            DefineKind::HeaderStructure => "defineHeaderStructure",
            DefineKind::SuccessStructure => "defineSuccessStructure",
        }
    }

    fn tag(self) -> &'static str {
        match self {
            DefineKind::Define => "apiDefine",
            DefineKind::ErrorStructure => "apiDefineErrorStructure",
            DefineKind::HeaderStructure => "apiDefineHeaderStructure",
            DefineKind::SuccessStructure => "apiDefineSuccessStructure",
        }
    }
}

/// `@apiDefine name [title]` with an optional description on the following lines.
pub struct DefineParser {
    kind: DefineKind,
}

impl DefineParser {
    pub fn new(kind: DefineKind) -> Self {
        Self { kind }
    }

    fn error(&self, message: &str) -> ParameterError {
        let tag = self.kind.tag();
        ParameterError::new(
            message,
            tag,
            &format!("@{} name", tag),
            &format!("@{} MyValidName", tag),
        )
    }
}

impl FieldParser for DefineParser {
    fn parse(&self, content: &str, _source: &str, _ctx: &mut ParseContext) -> Result<Option<Values>, ParameterError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(self.error("No arguments found."));
        }

        let (first_line, rest) = content.split_once('\n').unwrap_or((content, ""));
        let first_line = first_line.trim();
        let (name, title) = match first_line.split_once(char::is_whitespace) {
            Some((name, title)) => (name, title.trim()),
            None => (first_line, ""),
        };

        if !name.chars().all(is_word_char) {
            return Err(self.error("Name must contain only alphanumeric characters."));
        }

        let mut values = Values::new();
        values.insert("name".to_string(), Value::String(name.to_string()));
        values.insert("title".to_string(), Value::String(title.to_string()));
        values.insert("description".to_string(), Value::String(unindent(rest).trim_end().to_string()));
        Ok(Some(values))
    }

    fn path(&self, _ctx: &ParseContext) -> String {
        format!("global.{}", self.kind.target())
    }

    fn method(&self) -> AttachMethod {
        AttachMethod::Insert
    }

    fn markdown_fields(&self) -> &[&'static str] {
        &["description"]
    }

    fn deprecated(&self) -> bool {
        self.kind != DefineKind::Define
    }

    fn alternative(&self) -> Option<&'static str> {
        match self.kind {
            DefineKind::Define => None,
            _ => Some("@apiDefine"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(content: &str) -> Result<Option<Values>, ParameterError> {
        DefineParser::new(DefineKind::Define).parse(content, "", &mut ParseContext::default())
    }

    #[test]
    fn test_name_title_and_description() {
        let values = parse("UserNotFound Not found\n  The user was not found.\n  Check the id.").unwrap().unwrap();

        assert_eq!(
            Value::Object(values),
            json!({
                "name": "UserNotFound",
                "title": "Not found",
                "description": "The user was not found.\nCheck the id."
            })
        );
    }

    #[test]
    fn test_name_only() {
        let values = parse("Common").unwrap().unwrap();
        assert_eq!(values["name"], "Common");
        assert_eq!(values["title"], "");
        assert_eq!(values["description"], "");
    }

    #[test]
    fn test_missing_arguments() {
        let err = parse("").unwrap_err();
        assert_eq!(err.message, "No arguments found.");
        assert_eq!(err.element, "apiDefine");
    }

    #[test]
    fn test_invalid_name() {
        let err = parse("My-Group Title").unwrap_err();
        assert_eq!(err.message, "Name must contain only alphanumeric characters.");
    }

    #[test]
    fn test_structure_variant_is_deprecated() {
        let parser = DefineParser::new(DefineKind::ErrorStructure);
        assert!(parser.deprecated());
        assert_eq!(parser.alternative(), Some("@apiDefine"));
        assert_eq!(parser.path(&ParseContext::default()), "global.defineErrorStructure");
    }
}
