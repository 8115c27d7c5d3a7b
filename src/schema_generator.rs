//! Component schema synthesis from field declarations.
//!
//! Field names may be qualified: `objective.number` lands in the `Objective`
//! definition, `user:address.street` in `User`. The first contributing field
//! of a list decides the top-level definition the request body or response
//! refers to.

use crate::parsers::param::FieldDecl;
use crate::text::{remove_tags, upper_first};
use indexmap::IndexMap;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

const TYPES: [&str; 8] = ["string", "number", "integer", "boolean", "array", "file", "$ref", "object"];

static NUMERIC_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(-?\d+(?:\.\d+)?)?\s*-\s*(-?\d+(?:\.\d+)?)?\s*$").unwrap());
static LENGTH_RANGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d+)?\s*\.\.\s*(\d+)?\s*$").unwrap());

/// Prefix every component schema name carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Request,
    Response,
    Error,
}

impl SchemaKind {
    pub fn prefix(self) -> &'static str {
        match self {
            SchemaKind::Request => "Request",
            SchemaKind::Response => "Response",
            SchemaKind::Error => "Error",
        }
    }

    /// Component name of the definition for `object_name`.
    pub fn definition_name(self, object_name: &str) -> String {
        format!("{}{}", self.prefix(), upper_first(object_name))
    }

    pub fn reference(self, object_name: &str) -> String {
        format!("#/components/schemas/{}", self.definition_name(object_name))
    }
}

/// OpenAPI Schema object for a single property or parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Reference to another schema
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Items schema for array types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    #[serde(rename = "minLength", skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(rename = "maxLength", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
}

impl Schema {
    pub fn of_type(schema_type: &str) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            ..Self::default()
        }
    }

    pub fn reference(target: String) -> Self {
        Self {
            reference: Some(target),
            ..Self::default()
        }
    }
}

/// A component schema collecting the properties of one object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    #[serde(default)]
    pub properties: IndexMap<String, Schema>,
    /// Names of the non-optional properties, omitted when empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

/// What a field list contributed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldsOutcome {
    /// Object name of the top-level definition, if any field contributed
    pub top_level_ref: Option<String>,
    /// Lower-cased type of the first contributing field (`object` for responses)
    pub top_level_type: Option<String>,
}

impl FieldsOutcome {
    /// Schema pointing at the top-level definition; wrapped in an array when
    /// the first field declared one.
    pub fn schema(&self, kind: SchemaKind) -> Option<Schema> {
        let target = kind.reference(self.top_level_ref.as_deref()?);
        if self.top_level_type.as_deref() == Some("array") {
            Some(Schema {
                schema_type: Some("array".to_string()),
                items: Some(Box::new(Schema::reference(target))),
                ..Schema::default()
            })
        } else {
            Some(Schema::reference(target))
        }
    }
}

/// Splits a qualified field name into its object and property parts.
///
/// `a:b.c` gives object `a`, property `c`; `a.b.c` gives object `a.b`,
/// property `c`; a plain name has no object.
pub fn nested_name(field: &str) -> (Option<String>, String) {
    let mut object_name = None;
    let mut property = field;

    if field.contains(':') {
        let mut parts = field.split(':');
        object_name = parts.next().map(str::to_string);
        property = parts.next().unwrap_or_default();
    }

    match property.rsplit_once('.') {
        Some((object, last)) => (object_name.or_else(|| Some(object.to_string())), last.to_string()),
        None => (object_name, property.to_string()),
    }
}

/// Builds the schema of one declared field.
///
/// Unknown types degrade to `string`; `object` fields become references to
/// their own definition.
pub fn field_schema(kind: SchemaKind, field: &FieldDecl) -> Schema {
    let declared = field.field_type.as_deref().unwrap_or("string");
    let description = remove_tags(&field.description);
    let mut schema = Schema {
        schema_type: Some(declared.to_lowercase()),
        description: Some(description).filter(|d| !d.is_empty()),
        ..Schema::default()
    };

    apply_array(&mut schema, declared, kind);
    if schema.schema_type.as_deref() == Some("array") && schema.items.is_none() {
        schema.items = Some(Box::new(Schema::of_type("string")));
    }
    apply_format(&mut schema);
    apply_size(&mut schema, field.size.as_deref());

    if let Some(default) = field.default_value.as_ref().filter(|d| !d.is_empty()) {
        schema.default = Some(Value::String(default.clone()));
    }
    if let Some(allowed) = field.allowed_values.as_ref().filter(|a| !a.is_empty()) {
        let values: Vec<Value> = allowed.iter().cloned().map(Value::String).collect();
        let keeps_default = schema.default.as_ref().map_or(false, |d| values.contains(d));
        if !keeps_default {
            schema.default = values.first().cloned();
        }
        schema.enum_values = Some(values);
    }

    if schema.schema_type.as_deref() == Some("object") {
        schema.reference = Some(kind.reference(&field.field));
        schema.schema_type = None;
        schema.description = None;
    }

    if let Some(t) = schema.schema_type.as_deref() {
        if !TYPES.contains(&t) {
            schema.schema_type = Some("string".to_string());
        }
    }
    schema
}

/// `Type[]` becomes an array of `Type`; `$Name[]` an array of references to
/// `Name` lower-cased with its first letter capitalized.
fn apply_array(schema: &mut Schema, declared: &str, kind: SchemaKind) {
    let inner = match declared.strip_suffix("[]") {
        Some(inner) => inner,
        None => return,
    };
    schema.schema_type = Some("array".to_string());

    let inner = inner.to_lowercase();
    let items = match inner.strip_prefix('$') {
        Some(name) => Schema::reference(kind.reference(name)),
        None if inner.is_empty() => Schema::of_type("string"),
        None => Schema::of_type(&inner),
    };
    schema.items = Some(Box::new(items));
}

/// `type|format` keeps the format only for pairs OpenAPI knows.
fn apply_format(schema: &mut Schema) {
    let declared = match schema.schema_type.as_deref() {
        Some(t) if t.contains('|') => t.to_string(),
        _ => return,
    };
    let (base, format) = declared.split_once('|').unwrap_or_default();
    let allowed: &[&str] = match base {
        "integer" => &["int32", "int64"],
        "number" => &["float", "double"],
        "string" => &["byte", "binary", "password", "date", "datetime", "date-time"],
        _ => &[],
    };
    if allowed.contains(&format) {
        let format = if format == "datetime" { "date-time" } else { format };
        schema.format = Some(format.to_string());
    }
    schema.schema_type = Some(base.to_string());
}

/// `{min-max}` bounds numbers, `{min..max}` bounds string lengths.
fn apply_size(schema: &mut Schema, size: Option<&str>) {
    let size = match size {
        Some(size) => size,
        None => return,
    };
    match schema.schema_type.as_deref() {
        Some("number") | Some("integer") => {
            if let Some(caps) = NUMERIC_RANGE.captures(size) {
                schema.minimum = caps.get(1).and_then(|m| m.as_str().parse().ok());
                schema.maximum = caps.get(2).and_then(|m| m.as_str().parse().ok());
            }
        }
        Some("string") => {
            if let Some(caps) = LENGTH_RANGE.captures(size) {
                schema.min_length = caps.get(1).and_then(|m| m.as_str().parse().ok());
                schema.max_length = caps.get(2).and_then(|m| m.as_str().parse().ok());
            }
        }
        _ => debug!("size {{{}}} ignored for {:?}", size, schema.schema_type),
    }
}

/// Collects component definitions across all operations of a run.
#[derive(Debug, Default)]
pub struct SchemaGenerator {
    schemas: IndexMap<String, Definition>,
}

impl SchemaGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the definitions described by `fields`.
    ///
    /// Fields named in `skip` (path parameters of a request) do not
    /// contribute. Unqualified fields belong to the object named after the
    /// endpoint (`endpoint_name`).
    pub fn add_fields(
        &mut self,
        kind: SchemaKind,
        fields: &[FieldDecl],
        endpoint_name: &str,
        skip: &[String],
    ) -> FieldsOutcome {
        let mut outcome = FieldsOutcome::default();

        for field in fields.iter().filter(|f| !skip.contains(&f.field)) {
            let (object, property) = nested_name(&field.field);
            let mut object_name = object.unwrap_or_else(|| endpoint_name.to_string());
            let mut property = Some(property);

            if outcome.top_level_ref.is_none() {
                let declared = field.field_type.as_deref().unwrap_or("string").to_lowercase();
                let mut top_type = match kind {
                    SchemaKind::Request => declared.clone(),
                    SchemaKind::Response | SchemaKind::Error => "object".to_string(),
                };
                if declared == "array" || declared == "object" {
                    if declared == "array" {
                        top_type = declared;
                    }
                    object_name = property.take().unwrap_or_default();
                }
                outcome.top_level_type = Some(top_type);
                outcome.top_level_ref = Some(object_name.clone());
            }

            let key = kind.definition_name(&object_name);
            let definition = self.schemas.entry(key.clone()).or_default();

            if let Some(property) = property {
                debug!("schema {}: property {}", key, property);
                definition.properties.insert(property.clone(), field_schema(kind, field));
                if !field.optional && !definition.required.contains(&property) {
                    definition.required.push(property);
                }
            }
        }
        outcome
    }

    pub fn schemas(&self) -> &IndexMap<String, Definition> {
        &self.schemas
    }

    pub fn into_schemas(self) -> IndexMap<String, Definition> {
        self.schemas
    }
}
