//! Field declarations: `@apiParam`, `@apiHeader`, `@apiSuccess`, `@apiError`.
//!
//! Grammar: `[(group)] [{Type[{size}][=allowed,values]}] name|[name[=default]] [description]`

use super::{AttachMethod, FieldParser, ParseContext, Values};
use crate::error::ParameterError;
use crate::text::unindent;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

static FIELD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?s)^",
        // (group)
        r"\s*(?:\(\s*(.+?)\s*\)\s*)?",
        // {Type{size}=allowed}
        r"\s*(?:\{\s*([a-zA-Z0-9$()#:./\\\[\]_|-]+)\s*(?:\{\s*(.+?)\s*\}\s*)?\s*(?:=\s*(.+?))?\s*\}\s*)?",
        // name, [name], [name=default]
        r#"(\[?\s*([a-zA-Z0-9$:./\\_-]+(?:\[[a-zA-Z0-9./\\_-]*\])?)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|(.*?)(?:\s|\]|$)))?\s*\]?\s*)"#,
        // description
        r"(.*)?$",
    ))
    .unwrap()
});

static QUOTED_DOUBLE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""[^"]*[^"]""#).unwrap());
static QUOTED_SINGLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"'[^']*[^']'").unwrap());
static UNQUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^,\s]+").unwrap());

/// Which record section a field declaration belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Parameter,
    Header,
    Success,
    Error,
}

impl FieldKind {
    pub const ALL: [FieldKind; 4] = [FieldKind::Parameter, FieldKind::Header, FieldKind::Success, FieldKind::Error];

    /// Key of the section inside `local`.
    pub fn section(self) -> &'static str {
        match self {
            FieldKind::Parameter => "parameter",
            FieldKind::Header => "header",
            FieldKind::Success => "success",
            FieldKind::Error => "error",
        }
    }

    /// Group used when the declaration names none.
    pub fn default_group(self) -> &'static str {
        match self {
            FieldKind::Parameter => "Parameter",
            FieldKind::Header => "Header",
            FieldKind::Success => "Success 200",
            FieldKind::Error => "Error 4xx",
        }
    }

    /// Tag name used in diagnostics.
    pub fn tag(self) -> &'static str {
        match self {
            FieldKind::Parameter => "apiParam",
            FieldKind::Header => "apiHeader",
            FieldKind::Success => "apiSuccess",
            FieldKind::Error => "apiError",
        }
    }
}

/// One parsed field declaration as stored in the block record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDecl {
    #[serde(default)]
    pub group: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<String>>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default)]
    pub description: String,
}

/// Parses one field declaration, falling back to `default_group`.
pub fn parse_field(content: &str, default_group: &str) -> Option<FieldDecl> {
    let caps = FIELD_PATTERN.captures(content)?;
    let text = |i: usize| caps.get(i).map(|m| m.as_str().to_string());

    let optional = caps.get(5).map(|m| m.as_str().starts_with('[')).unwrap_or(false);
    let default_value = text(7).or_else(|| text(8)).or_else(|| text(9).filter(|v| !v.is_empty()));

    Some(FieldDecl {
        group: text(1).unwrap_or_else(|| default_group.to_string()),
        field_type: text(2),
        size: text(3),
        allowed_values: caps.get(4).map(|m| split_allowed_values(m.as_str())),
        optional,
        field: text(6).unwrap_or_default(),
        default_value,
        description: unindent(caps.get(10).map(|m| m.as_str()).unwrap_or_default()),
    })
}

/// Splits `"a","b"`, `'a','b'` or `a,b` lists; quotes are not kept.
fn split_allowed_values(raw: &str) -> Vec<String> {
    let pattern: &Regex = match raw.chars().next() {
        Some('"') => &QUOTED_DOUBLE,
        Some('\'') => &QUOTED_SINGLE,
        _ => &UNQUOTED,
    };
    pattern
        .find_iter(raw)
        .map(|m| m.as_str().trim_matches(|c| c == '"' || c == '\'').to_string())
        .collect()
}

/// Parser shared by the four field declaration tags.
pub struct ParamParser {
    kind: FieldKind,
}

impl ParamParser {
    pub fn new(kind: FieldKind) -> Self {
        Self { kind }
    }
}

impl FieldParser for ParamParser {
    fn parse(&self, content: &str, _source: &str, ctx: &mut ParseContext) -> Result<Option<Values>, ParameterError> {
        let decl = match parse_field(content, self.kind.default_group()) {
            Some(decl) => decl,
            None => return Ok(None),
        };
        ctx.current_group = Some(decl.group.clone());

        match serde_json::to_value(decl) {
            Ok(Value::Object(values)) => Ok(Some(values)),
            _ => Ok(None),
        }
    }

    fn path(&self, ctx: &ParseContext) -> String {
        let group = ctx.current_group.as_deref().unwrap_or(self.kind.default_group());
        format!("local.{}.fields.{}", self.kind.section(), group)
    }

    fn method(&self) -> AttachMethod {
        AttachMethod::Push
    }

    fn markdown_fields(&self) -> &[&'static str] {
        match self.kind {
            FieldKind::Header => &["description"],
            _ => &["description", "type"],
        }
    }

    fn markdown_remove_p_tags(&self) -> &[&'static str] {
        match self.kind {
            FieldKind::Header => &[],
            _ => &["type"],
        }
    }
}
