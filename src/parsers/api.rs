use super::{AttachMethod, FieldParser, ParseContext, Values};
use crate::error::ParameterError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static API_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^(?:(?:\{(.+?)\})?\s*)?(.+?)(?:\s+(.+?))?$").unwrap());

/// `@api {verb} url [title]`
pub struct ApiParser;

impl FieldParser for ApiParser {
    fn parse(&self, content: &str, _source: &str, _ctx: &mut ParseContext) -> Result<Option<Values>, ParameterError> {
        let caps = match API_PATTERN.captures(content) {
            Some(caps) => caps,
            None => return Ok(None),
        };

        let mut values = Values::new();
        if let Some(verb) = caps.get(1) {
            values.insert("type".to_string(), Value::String(verb.as_str().to_string()));
        }
        let url = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        values.insert("url".to_string(), Value::String(url.to_string()));
        let title = caps.get(3).map(|m| m.as_str()).unwrap_or_default();
        values.insert("title".to_string(), Value::String(title.to_string()));
        Ok(Some(values))
    }

    fn path(&self, _ctx: &ParseContext) -> String {
        "local".to_string()
    }

    fn method(&self) -> AttachMethod {
        AttachMethod::Insert
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(content: &str) -> Option<Values> {
        ApiParser.parse(content, "", &mut ParseContext::default()).unwrap()
    }

    #[test]
    fn test_parse_full_declaration() {
        let values = parse("{get} /users/:id Read a user").unwrap();
        assert_eq!(Value::Object(values), json!({"type": "get", "url": "/users/:id", "title": "Read a user"}));
    }

    #[test]
    fn test_parse_without_title() {
        let values = parse("{post} /users").unwrap();
        assert_eq!(values["url"], "/users");
        assert_eq!(values["title"], "");
    }

    #[test]
    fn test_parse_without_verb() {
        let values = parse("/health Health check").unwrap();
        assert!(!values.contains_key("type"));
        assert_eq!(values["url"], "/health");
        assert_eq!(values["title"], "Health check");
    }

    #[test]
    fn test_empty_content_yields_nothing() {
        assert!(parse("").is_none());
    }
}
