use crate::error::Result;
use crate::parsers::param::{FieldDecl, FieldKind};
use crate::schema_generator::{field_schema, Definition, Schema, SchemaGenerator, SchemaKind};
use crate::text::remove_tags;
use indexmap::IndexMap;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

static PATH_PARAM: Lazy<Regex> = Lazy::new(|| Regex::new(r":(\w+)").unwrap());

const JSON_MEDIA_TYPE: &str = "application/json";

const VERBS: [&str; 7] = ["get", "post", "put", "delete", "patch", "options", "head"];

/// Endpoint record as left by the parser and the workers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Endpoint {
    #[serde(rename = "type", default)]
    pub verb: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub deprecated: Option<Value>,
    #[serde(default)]
    pub parameter: Option<FieldSection>,
    #[serde(default)]
    pub header: Option<FieldSection>,
    #[serde(default)]
    pub success: Option<FieldSection>,
    #[serde(default)]
    pub error: Option<FieldSection>,
}

/// One `local.<section>` of an endpoint record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldSection {
    #[serde(default)]
    pub fields: IndexMap<String, Vec<FieldDecl>>,
}

impl FieldSection {
    /// Declarations of the kind's default group (`Parameter`, `Header`,
    /// `Success 200`, `Error 4xx`); other groups are not synthesized.
    fn default_fields(section: Option<&FieldSection>, kind: FieldKind) -> Vec<FieldDecl> {
        section
            .and_then(|s| s.fields.get(kind.default_group()))
            .cloned()
            .unwrap_or_default()
    }
}

/// OpenAPI Info object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI PathItem object - all operations of a single path
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
}

impl PathItem {
    /// Slot for a lower-cased verb; `None` for verbs OpenAPI has no field for.
    fn slot(&mut self, verb: &str) -> Option<&mut Option<Operation>> {
        match verb {
            "get" => Some(&mut self.get),
            "post" => Some(&mut self.post),
            "put" => Some(&mut self.put),
            "delete" => Some(&mut self.delete),
            "patch" => Some(&mut self.patch),
            "options" => Some(&mut self.options),
            "head" => Some(&mut self.head),
            _ => None,
        }
    }

    pub fn operation(&self, verb: &str) -> Option<&Operation> {
        match verb {
            "get" => self.get.as_ref(),
            "post" => self.post.as_ref(),
            "put" => self.put.as_ref(),
            "delete" => self.delete.as_ref(),
            "patch" => self.patch.as_ref(),
            "options" => self.options.as_ref(),
            "head" => self.head.as_ref(),
            _ => None,
        }
    }
}

/// OpenAPI Operation object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(rename = "operationId", skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    pub parameters: Vec<Parameter>,
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    pub responses: IndexMap<String, Response>,
}

/// OpenAPI Parameter object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    /// Parameter location (path, header)
    #[serde(rename = "in")]
    pub location: String,
    pub required: bool,
    pub schema: Schema,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI RequestBody object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestBody {
    pub description: String,
    pub required: bool,
    pub content: IndexMap<String, MediaType>,
}

/// OpenAPI MediaType object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaType {
    pub schema: Schema,
}

/// OpenAPI Response object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<IndexMap<String, MediaType>>,
}

impl Response {
    fn json(description: &str, schema: Schema) -> Self {
        Self {
            description: description.to_string(),
            content: Some(json_content(schema)),
        }
    }
}

/// OpenAPI Components object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Components {
    pub schemas: IndexMap<String, Definition>,
}

/// Complete OpenAPI document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenApiDocument {
    pub openapi: String,
    pub info: Info,
    pub paths: IndexMap<String, PathItem>,
    pub components: Components,
}

fn json_content(schema: Schema) -> IndexMap<String, MediaType> {
    let mut content = IndexMap::new();
    content.insert(JSON_MEDIA_TYPE.to_string(), MediaType { schema });
    content
}

/// Converts `:param` segments to `{param}` and returns the parameter names in order.
pub fn convert_path_format(url: &str) -> (String, Vec<String>) {
    let keys = PATH_PARAM
        .captures_iter(url)
        .map(|caps| caps[1].to_string())
        .collect();
    (PATH_PARAM.replace_all(url, "{$1}").into_owned(), keys)
}

fn field_parameter(field: &FieldDecl, location: &str) -> Parameter {
    let mut schema = field_schema(SchemaKind::Request, field);
    let description = schema.description.take();
    Parameter {
        name: field.field.clone(),
        location: location.to_string(),
        required: !field.optional,
        schema,
        description,
    }
}

/// OpenAPI document builder
pub struct OpenApiBuilder {
    info: Info,
    paths: IndexMap<String, PathItem>,
    schema_gen: SchemaGenerator,
}

impl OpenApiBuilder {
    pub fn new(info: Info) -> Self {
        debug!("Initializing OpenApiBuilder");
        Self {
            info,
            paths: IndexMap::new(),
            schema_gen: SchemaGenerator::new(),
        }
    }

    /// Adds one endpoint record. Records without a URL or with a verb OpenAPI
    /// cannot express are skipped with a warning.
    pub fn add_endpoint(&mut self, endpoint: &Endpoint) {
        let url = match endpoint.url.as_deref() {
            Some(url) => url,
            None => {
                warn!("skipping endpoint {:?} without url", endpoint.name);
                return;
            }
        };
        let verb = match endpoint.verb.to_lowercase().as_str() {
            "del" => "delete".to_string(),
            other => other.to_string(),
        };
        debug!("Adding endpoint: {} {}", verb, url);

        if !VERBS.contains(&verb.as_str()) {
            warn!("skipping {} {}: unsupported verb", endpoint.verb, url);
            return;
        }

        let (openapi_path, path_keys) = convert_path_format(url);
        let operation = Self::operation(&mut self.schema_gen, endpoint, &verb, &path_keys);
        if let Some(slot) = self.paths.entry(openapi_path).or_default().slot(&verb) {
            *slot = Some(operation);
        }
    }

    fn operation(schema_gen: &mut SchemaGenerator, endpoint: &Endpoint, verb: &str, path_keys: &[String]) -> Operation {
        let parameter_fields = FieldSection::default_fields(endpoint.parameter.as_ref(), FieldKind::Parameter);
        let header_fields = FieldSection::default_fields(endpoint.header.as_ref(), FieldKind::Header);

        let mut parameters: Vec<Parameter> = Vec::new();
        let candidates = parameter_fields
            .iter()
            .filter(|f| path_keys.contains(&f.field))
            .map(|f| field_parameter(f, "path"))
            .chain(header_fields.iter().map(|f| field_parameter(f, "header")));
        for parameter in candidates {
            let seen = parameters
                .iter()
                .any(|p| p.name == parameter.name && p.location == parameter.location);
            if !seen {
                parameters.push(parameter);
            }
        }

        let request_body = if ["get", "head", "delete"].contains(&verb) {
            None
        } else {
            let outcome = schema_gen.add_fields(SchemaKind::Request, &parameter_fields, &endpoint.name, path_keys);
            outcome.schema(SchemaKind::Request).map(|schema| RequestBody {
                description: format!("{} request", outcome.top_level_ref.as_deref().unwrap_or_default()),
                required: !parameter_fields.is_empty(),
                content: json_content(schema),
            })
        };

        let mut responses = IndexMap::new();
        let success_fields = FieldSection::default_fields(endpoint.success.as_ref(), FieldKind::Success);
        let success = schema_gen.add_fields(SchemaKind::Response, &success_fields, &endpoint.name, &[]);
        if let Some(schema) = success.schema(SchemaKind::Response) {
            responses.insert("200".to_string(), Response::json("Successful response", schema));
        }
        let error_fields = FieldSection::default_fields(endpoint.error.as_ref(), FieldKind::Error);
        let error = schema_gen.add_fields(SchemaKind::Error, &error_fields, &endpoint.name, &[]);
        if let Some(schema) = error.schema(SchemaKind::Error) {
            responses.insert("404".to_string(), Response::json("Error response", schema));
        }
        if responses.is_empty() {
            responses.insert(
                "200".to_string(),
                Response {
                    description: "Successful response".to_string(),
                    content: None,
                },
            );
        }

        let summary = Some(remove_tags(&endpoint.description).trim().to_string())
            .filter(|s| !s.is_empty())
            .or_else(|| Some(endpoint.title.clone()).filter(|t| !t.is_empty()));

        Operation {
            tags: Some(endpoint.group.clone()).filter(|g| !g.is_empty()).into_iter().collect(),
            summary,
            operation_id: Some(endpoint.name.clone()).filter(|n| !n.is_empty()),
            deprecated: endpoint.deprecated.as_ref().map(|_| true),
            parameters,
            request_body,
            responses,
        }
    }

    /// Build the final OpenAPI document
    pub fn build(self) -> OpenApiDocument {
        debug!("Building final OpenAPI document");
        OpenApiDocument {
            openapi: "3.0.2".to_string(),
            info: self.info,
            paths: self.paths,
            components: Components {
                schemas: self.schema_gen.into_schemas(),
            },
        }
    }
}

/// Synthesizes the document from endpoint records.
///
/// # Errors
///
/// Returns an error if a record does not have the shape of an endpoint.
pub fn build_document(records: &[Value], info: Info) -> Result<OpenApiDocument> {
    let mut builder = OpenApiBuilder::new(info);
    for record in records {
        let endpoint: Endpoint = serde_json::from_value(record.clone())?;
        builder.add_endpoint(&endpoint);
    }
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn info() -> Info {
        Info {
            title: "Test API".to_string(),
            version: "1.0.0".to_string(),
            description: None,
        }
    }

    fn build(records: Vec<Value>) -> OpenApiDocument {
        build_document(&records, info()).unwrap()
    }

    #[test]
    fn test_convert_path_format() {
        assert_eq!(
            convert_path_format("/users/:id/posts/:postId"),
            ("/users/{id}/posts/{postId}".to_string(), vec!["id".to_string(), "postId".to_string()])
        );
        assert_eq!(convert_path_format("/health"), ("/health".to_string(), vec![]));
    }

    #[test]
    fn test_get_with_path_and_header_parameters() {
        let doc = build(vec![json!({
            "type": "get",
            "url": "/users/:id",
            "name": "GetUser",
            "group": "User",
            "description": "<p>Read a user</p>",
            "parameter": {"fields": {"Parameter": [
                {"group": "Parameter", "type": "Number", "field": "id", "optional": false, "description": "<p>User id</p>"},
                {"group": "Parameter", "type": "String", "field": "fields", "optional": true, "description": ""}
            ]}},
            "header": {"fields": {"Header": [
                {"group": "Header", "type": "String", "field": "token", "optional": false, "description": ""}
            ]}}
        })]);

        let operation = doc.paths["/users/{id}"].get.as_ref().unwrap();
        assert_eq!(operation.tags, vec!["User".to_string()]);
        assert_eq!(operation.summary.as_deref(), Some("Read a user"));
        assert_eq!(operation.operation_id.as_deref(), Some("GetUser"));
        assert!(operation.request_body.is_none());

        let parameters = serde_json::to_value(&operation.parameters).unwrap();
        assert_eq!(
            parameters,
            json!([
                {"name": "id", "in": "path", "required": true, "schema": {"type": "number"}, "description": "User id"},
                {"name": "token", "in": "header", "required": true, "schema": {"type": "string"}}
            ])
        );
        assert_eq!(operation.responses["200"].description, "Successful response");
        assert!(operation.responses["200"].content.is_none());
    }

    #[test]
    fn test_put_request_body_excludes_path_keys() {
        let doc = build(vec![json!({
            "type": "put",
            "url": "/users/:id",
            "name": "PutUser",
            "parameter": {"fields": {"Parameter": [
                {"group": "Parameter", "type": "Number", "field": "id"},
                {"group": "Parameter", "type": "String", "field": "email"}
            ]}}
        })]);

        let operation = doc.paths["/users/{id}"].put.as_ref().unwrap();
        let body = operation.request_body.as_ref().unwrap();
        assert_eq!(body.description, "PutUser request");
        assert!(body.required);
        assert_eq!(
            body.content[JSON_MEDIA_TYPE].schema.reference.as_deref(),
            Some("#/components/schemas/RequestPutUser")
        );
        let definition = &doc.components.schemas["RequestPutUser"];
        assert_eq!(definition.properties.keys().collect::<Vec<_>>(), vec!["email"]);
    }

    #[test]
    fn test_success_and_error_responses() {
        let doc = build(vec![json!({
            "type": "get",
            "url": "/users/:id",
            "name": "GetUser",
            "success": {"fields": {"Success 200": [{"group": "Success 200", "type": "String", "field": "email"}]}},
            "error": {"fields": {"Error 4xx": [{"group": "Error 4xx", "field": "UserNotFound"}]}}
        })]);

        let operation = doc.paths["/users/{id}"].get.as_ref().unwrap();
        let schema_ref = |code: &str| {
            operation.responses[code].content.as_ref().unwrap()[JSON_MEDIA_TYPE]
                .schema
                .reference
                .clone()
        };
        assert_eq!(schema_ref("200").as_deref(), Some("#/components/schemas/ResponseGetUser"));
        assert_eq!(schema_ref("404").as_deref(), Some("#/components/schemas/ErrorGetUser"));
        assert_eq!(operation.responses["404"].description, "Error response");
        assert!(doc.components.schemas.contains_key("ErrorGetUser"));
    }

    #[test]
    fn test_only_default_groups_are_synthesized() {
        let doc = build(vec![json!({
            "type": "post",
            "url": "/users",
            "name": "Create",
            "parameter": {"fields": {
                "Parameter": [{"group": "Parameter", "type": "String", "field": "email"}],
                "Admin": [{"group": "Admin", "type": "Boolean", "field": "superuser"}]
            }},
            "header": {"fields": {"Internal": [{"group": "Internal", "type": "String", "field": "x-debug"}]}},
            "success": {"fields": {
                "Success 200": [{"group": "Success 200", "type": "Number", "field": "id"}],
                "Created 201": [{"group": "Created 201", "type": "String", "field": "location"}]
            }},
            "error": {"fields": {
                "Error 4xx": [{"group": "Error 4xx", "type": "String", "field": "message"}],
                "Error 5xx": [{"group": "Error 5xx", "type": "String", "field": "trace"}]
            }}
        })]);

        let schemas = &doc.components.schemas;
        assert_eq!(schemas["RequestCreate"].properties.keys().collect::<Vec<_>>(), vec!["email"]);
        assert_eq!(schemas["ResponseCreate"].properties.keys().collect::<Vec<_>>(), vec!["id"]);
        assert_eq!(schemas["ResponseCreate"].required, vec!["id".to_string()]);
        assert_eq!(schemas["ErrorCreate"].properties.keys().collect::<Vec<_>>(), vec!["message"]);
        assert!(doc.paths["/users"].post.as_ref().unwrap().parameters.is_empty());
    }

    #[test]
    fn test_verbs_share_path_in_first_appearance_order() {
        let doc = build(vec![
            json!({"type": "get", "url": "/b", "name": "GetB"}),
            json!({"type": "get", "url": "/a/:id", "name": "GetA"}),
            json!({"type": "del", "url": "/b", "name": "DeleteB"}),
        ]);

        assert_eq!(doc.paths.keys().collect::<Vec<_>>(), vec!["/b", "/a/{id}"]);
        assert!(doc.paths["/b"].get.is_some());
        assert!(doc.paths["/b"].delete.is_some());
    }

    #[test]
    fn test_unsupported_verb_and_missing_url_are_skipped() {
        let doc = build(vec![
            json!({"type": "trace", "url": "/a"}),
            json!({"type": "get", "name": "NoUrl"}),
        ]);

        assert!(doc.paths.is_empty());
    }

    #[test]
    fn test_duplicate_parameters_keep_first() {
        let doc = build(vec![json!({
            "type": "get",
            "url": "/users/:id",
            "parameter": {"fields": {"Parameter": [
                {"field": "id", "type": "Number", "description": "local"},
                {"field": "id", "type": "String", "description": "inherited"}
            ]}}
        })]);

        let parameters = &doc.paths["/users/{id}"].get.as_ref().unwrap().parameters;
        assert_eq!(parameters.len(), 1);
        assert_eq!(parameters[0].description.as_deref(), Some("local"));
    }

    #[test]
    fn test_deprecated_and_summary_fallback() {
        let doc = build(vec![json!({
            "type": "post",
            "url": "/legacy",
            "title": "Old endpoint",
            "deprecated": {"content": "use /v2"}
        })]);

        let operation = doc.paths["/legacy"].post.as_ref().unwrap();
        assert_eq!(operation.deprecated, Some(true));
        assert_eq!(operation.summary.as_deref(), Some("Old endpoint"));
        assert!(operation.tags.is_empty());
        assert!(operation.request_body.is_none());
    }

    #[test]
    fn test_document_shape() {
        let doc = build(vec![]);
        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(
            value,
            json!({
                "openapi": "3.0.2",
                "info": {"title": "Test API", "version": "1.0.0"},
                "paths": {},
                "components": {"schemas": {}}
            })
        );
    }
}
