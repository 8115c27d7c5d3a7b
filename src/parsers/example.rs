use super::param::FieldKind;
use super::{FieldParser, ParseContext, Values};
use crate::error::ParameterError;
use crate::text::unindent;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static FIRST_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:\{\s*([a-zA-Z0-9./\\\[\]_-]+)\s*\}\s*)?(.*)$").unwrap());

/// `@apiExample [{type}] title` followed by the example body on the next lines.
///
/// The field-specific variants (`@apiParamExample`, ...) store their examples
/// next to the fields of the same section.
pub struct ExampleParser {
    kind: Option<FieldKind>,
}

impl ExampleParser {
    pub fn general() -> Self {
        Self { kind: None }
    }

    pub fn for_fields(kind: FieldKind) -> Self {
        Self { kind: Some(kind) }
    }

    fn tag(&self) -> String {
        match self.kind {
            Some(kind) => format!("{}Example", kind.tag()),
            None => "apiExample".to_string(),
        }
    }
}

impl FieldParser for ExampleParser {
    fn parse(&self, content: &str, _source: &str, _ctx: &mut ParseContext) -> Result<Option<Values>, ParameterError> {
        let (first_line, body) = content.split_once('\n').unwrap_or((content, ""));

        if body.trim().is_empty() {
            let tag = self.tag();
            return Err(ParameterError::new(
                "No example found.",
                &tag,
                &format!("@{} [{{type}}] title\nexample", tag),
                &format!("@{} {{curl}} Example usage:\ncurl -i http://localhost/user/4711", tag),
            ));
        }

        let (example_type, title) = match FIRST_LINE.captures(first_line) {
            Some(caps) => (
                caps.get(1).map(|m| m.as_str()).unwrap_or("json").to_string(),
                caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default().to_string(),
            ),
            None => ("json".to_string(), first_line.trim().to_string()),
        };

        let mut values = Values::new();
        values.insert("title".to_string(), Value::String(title));
        values.insert("content".to_string(), Value::String(unindent(body)));
        values.insert("type".to_string(), Value::String(example_type));
        Ok(Some(values))
    }

    fn path(&self, _ctx: &ParseContext) -> String {
        match self.kind {
            Some(kind) => format!("local.{}.examples", kind.section()),
            None => "local.examples".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_example_with_type_and_title() {
        let parser = ExampleParser::general();
        let values = parser
            .parse("{curl} Example usage:\n    curl -i http://localhost/user/4711", "", &mut ParseContext::default())
            .unwrap()
            .unwrap();

        assert_eq!(
            Value::Object(values),
            json!({
                "title": "Example usage:",
                "content": "curl -i http://localhost/user/4711",
                "type": "curl"
            })
        );
    }

    #[test]
    fn test_example_defaults_to_json() {
        let parser = ExampleParser::for_fields(FieldKind::Success);
        let values = parser
            .parse("Success-Response:\n  {\n    \"id\": 1\n  }", "", &mut ParseContext::default())
            .unwrap()
            .unwrap();

        assert_eq!(values["type"], "json");
        assert_eq!(values["content"], "{\n  \"id\": 1\n}");
        assert_eq!(parser.path(&ParseContext::default()), "local.success.examples");
    }

    #[test]
    fn test_body_with_wide_space_line() {
        let parser = ExampleParser::for_fields(FieldKind::Success);
        let values = parser
            .parse("{json} Ok\n    {\n \u{3000}\n      \"id\": 1\n    }", "", &mut ParseContext::default())
            .unwrap()
            .unwrap();

        assert_eq!(values["content"], "{\n\n  \"id\": 1\n}");
    }

    #[test]
    fn test_missing_body() {
        let parser = ExampleParser::for_fields(FieldKind::Error);
        let err = parser.parse("{json} Only a title", "", &mut ParseContext::default()).unwrap_err();

        assert_eq!(err.message, "No example found.");
        assert_eq!(err.element, "apiErrorExample");
    }
}
