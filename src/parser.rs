use crate::block::find_blocks;
use crate::element::{find_elements, Element, ElementHook};
use crate::error::{Error, ParameterError, Result};
use crate::language::{Language, LanguageTable};
use crate::markdown::{render_field, CommonMarkRenderer, MarkdownRenderer};
use crate::parsers::{builtin_parsers, AttachMethod, FieldParser, ParseContext, Values};
use crate::scanner::SourceUnit;
use indexmap::IndexMap;
use log::{debug, warn};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Options controlling which blocks are parsed and how text fields are rendered.
pub struct ParseOptions {
    /// Keep blocks marked with `@apiPrivate`
    pub show_private: bool,
    /// Renderer for the markdown fields of each tag; `None` keeps the raw text
    pub markdown: Option<Box<dyn MarkdownRenderer>>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            show_private: false,
            markdown: Some(Box::new(CommonMarkRenderer::new())),
        }
    }
}

/// Structured record of one annotation block.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BlockData {
    /// Definitions meant for inheritance (`@apiDefine`, ...)
    pub global: Map<String, Value>,
    /// The block's own endpoint data
    pub local: Map<String, Value>,
    /// Values of tags that also extend the block root, e.g. `version`
    pub root: Map<String, Value>,
    /// 1-based position of the block inside its file
    pub index: usize,
}

impl BlockData {
    /// Version declared with `@apiVersion`, if any.
    pub fn version(&self) -> Option<&str> {
        self.root.get("version").and_then(Value::as_str)
    }
}

/// All accepted blocks of one source file, in source order.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    /// Path to the source file
    pub path: PathBuf,
    pub blocks: Vec<BlockData>,
}

/// Registry of tag parsers that turns annotated source files into block records.
///
/// # Example
///
/// ```no_run
/// use openapi_from_comments::parser::{AnnotationParser, ParseOptions};
/// use openapi_from_comments::scanner::SourceUnit;
/// use std::path::Path;
///
/// let unit = SourceUnit::read(Path::new("src/users.js")).unwrap();
/// let mut parser = AnnotationParser::new(ParseOptions::default());
/// let parsed = parser.parse_source(&unit).unwrap();
/// println!("Parsed {} blocks", parsed.map(|f| f.blocks.len()).unwrap_or(0));
/// ```
pub struct AnnotationParser {
    languages: LanguageTable,
    parsers: IndexMap<String, Box<dyn FieldParser>>,
    hooks: Vec<Box<dyn ElementHook>>,
    options: ParseOptions,
    deprecations: HashMap<String, usize>,
}

impl AnnotationParser {
    /// Creates a parser with the built-in languages and tag parsers.
    pub fn new(options: ParseOptions) -> Self {
        let mut parsers = IndexMap::new();
        for (name, parser) in builtin_parsers() {
            debug!("inject parser: {}", name);
            parsers.insert(name.to_string(), parser);
        }

        Self {
            languages: LanguageTable::new(),
            parsers,
            hooks: Vec::new(),
            options,
            deprecations: HashMap::new(),
        }
    }

    /// Registers or replaces the comment syntax for a language key such as `.rb`.
    pub fn add_language(&mut self, key: &str, language: Language) {
        debug!("inject parser language: {}", key);
        self.languages.add_language(key, language);
    }

    /// Registers or replaces the parser of a tag. The name is matched case-insensitively.
    pub fn add_parser(&mut self, name: &str, parser: Box<dyn FieldParser>) {
        debug!("inject parser: {}", name);
        self.parsers.insert(name.to_lowercase(), parser);
    }

    pub fn add_hook(&mut self, hook: Box<dyn ElementHook>) {
        self.hooks.push(hook);
    }

    /// Parses every source unit, keeping the files that produced blocks.
    ///
    /// The first parse failure aborts the whole run.
    pub fn parse_sources(&mut self, units: &[SourceUnit]) -> Result<Vec<ParsedFile>> {
        let mut parsed_files = Vec::new();
        for unit in units {
            if let Some(parsed) = self.parse_source(unit)? {
                debug!("parse file: {}", unit.path.display());
                parsed_files.push(parsed);
            }
        }
        debug!("Parsing complete: {} of {} files documented", parsed_files.len(), units.len());
        Ok(parsed_files)
    }

    /// Parses one source unit.
    ///
    /// # Returns
    ///
    /// `None` when the file has no documentation block or none of its blocks
    /// carries an `@api*` tag.
    pub fn parse_source(&mut self, unit: &SourceUnit) -> Result<Option<ParsedFile>> {
        debug!("inspect file: {}", unit.path.display());
        debug!("size: {}", unit.text.len());

        let blocks = find_blocks(&unit.text, self.languages.get(&unit.language));
        if blocks.is_empty() {
            return Ok(None);
        }

        let elements: Vec<Vec<Element>> = blocks
            .iter()
            .enumerate()
            .map(|(i, block)| {
                let elements = find_elements(block, &unit.path, &self.hooks);
                debug!("count elements in block {}: {}", i, elements.len());
                elements
            })
            .collect();

        let api_blocks: Vec<usize> = (0..elements.len())
            .filter(|&i| self.is_api_block(i, &elements[i]))
            .collect();
        if api_blocks.is_empty() {
            return Ok(None);
        }

        let mut parsed_blocks = Vec::new();
        for i in api_blocks {
            let data = self.parse_block(&elements[i], i, &unit.path)?;
            if data.index > 0 {
                parsed_blocks.push(data);
            }
        }

        if parsed_blocks.is_empty() {
            return Ok(None);
        }
        Ok(Some(ParsedFile {
            path: unit.path.clone(),
            blocks: parsed_blocks,
        }))
    }

    /// A block is documentation when one of its tags starts with `api`.
    /// `@apiIgnore` drops it, so does `@apiPrivate` unless private blocks are shown.
    fn is_api_block(&self, index: usize, elements: &[Element]) -> bool {
        let mut found = false;
        for element in elements {
            if element.name.starts_with("apiignore") {
                debug!("apiIgnore found in block: {}", index);
                return false;
            }
            if !self.options.show_private && element.name.starts_with("apiprivate") {
                debug!("private flag is set to false and apiPrivate found in block: {}", index);
                return false;
            }
            if element.name.starts_with("api") {
                found = true;
            }
        }
        if found {
            debug!("api found in block: {}", index);
        }
        found
    }

    fn parse_block(&mut self, elements: &[Element], index: usize, file: &Path) -> Result<BlockData> {
        let mut data = BlockData::default();
        let mut ctx = ParseContext::default();
        let mut allowed_multiple = 0;

        for element in elements {
            let parser = match self.parsers.get(&element.name) {
                Some(parser) => parser,
                None => {
                    warn!("parser plugin '{}' not found in block: {}", element.name, index);
                    continue;
                }
            };
            debug!("found @{} in block: {}", element.source_name, index);

            if parser.deprecated() {
                report_deprecation(&mut self.deprecations, parser.as_ref(), element, file, index);
            }

            let fail = |message: &str| element_error(message, file, index, element, None);

            let mut values = parser
                .parse(element.content.trim(), &element.source, &mut ctx)
                .map_err(|e| element_error(&e.message.clone(), file, index, element, Some(e)))?
                .ok_or_else(|| fail("Empty parser result."))?;

            let path = parser.path(&ctx);
            if path.is_empty() {
                return Err(fail("Attach path is not defined for this tag."));
            }
            let method = parser.method();

            if let Some(renderer) = self.options.markdown.as_deref() {
                render_markdown_fields(renderer, parser.as_ref(), &mut values);
            }

            let global_path = path == "global" || path.starts_with("global.");
            if parser.prevent_global() && data.global.len() > allowed_multiple {
                return Err(fail("Only one definition or usage is allowed in the same block."));
            }
            if global_path {
                if parser.allow_multiple() {
                    allowed_multiple += 1;
                } else {
                    if !data.global.is_empty() {
                        return Err(fail("Only one definition is allowed in the same block."));
                    }
                    if parser.prevent_global() {
                        return Err(fail("Only one definition or usage is allowed in the same block."));
                    }
                }
            }

            if parser.extend_root() {
                data.root.extend(values.clone());
            }

            let segments: Vec<&str> = path.split('.').collect();
            let (target, rest) = match segments[0] {
                "global" => (&mut data.global, &segments[1..]),
                "local" => (&mut data.local, &segments[1..]),
                _ => (&mut data.root, &segments[..]),
            };
            attach(target, rest, method, values)
                .map_err(|_| fail(&format!("Cannot attach values at '{}'.", path)))?;

            data.index = index + 1;
        }

        Ok(data)
    }
}

fn element_error(message: &str, file: &Path, index: usize, element: &Element, cause: Option<ParameterError>) -> Error {
    let (usage, example) = match cause {
        Some(cause) => (Some(cause.usage), Some(cause.example)),
        None => (None, None),
    };
    Error::ElementParsing {
        message: message.to_string(),
        file: file.to_path_buf(),
        block: index + 1,
        element: element.source_name.clone(),
        source_text: element.source.clone(),
        usage,
        example,
    }
}

/// Warns once per tag spelling, later occurrences are only traced.
/// Returns whether the warning was emitted.
fn report_deprecation(
    counts: &mut HashMap<String, usize>,
    parser: &dyn FieldParser,
    element: &Element,
    file: &Path,
    index: usize,
) -> bool {
    let count = counts.entry(element.source_name.clone()).or_insert(0);
    *count += 1;

    let message = match parser.alternative() {
        Some(alternative) => format!("@{} is deprecated, please use {}", element.source_name, alternative),
        None => format!("@{} is deprecated", element.source_name),
    };
    let first = *count == 1;
    if first {
        warn!("{}", message);
    } else {
        debug!("{}", message);
    }
    debug!("in file: {}, block: {}", file.display(), index);
    first
}

fn render_markdown_fields(renderer: &dyn MarkdownRenderer, parser: &dyn FieldParser, values: &mut Values) {
    for field in parser.markdown_fields() {
        let remove_p_tags = parser.markdown_remove_p_tags().contains(field);
        if let Some(Value::String(text)) = value_at_mut(values, field) {
            if !text.is_empty() {
                *text = render_field(renderer, text, remove_p_tags);
            }
        }
    }
}

fn value_at_mut<'a>(values: &'a mut Values, path: &str) -> Option<&'a mut Value> {
    let mut parts = path.split('.');
    let mut current = values.get_mut(parts.next()?)?;
    for part in parts {
        current = current.as_object_mut()?.get_mut(part)?;
    }
    Some(current)
}

/// Attaches `values` below `segments`, creating missing intermediate objects.
///
/// The last segment is created as an array for [`AttachMethod::Push`] and as an
/// object for [`AttachMethod::Insert`]. Existing values of the wrong shape are rejected.
fn attach(target: &mut Map<String, Value>, segments: &[&str], method: AttachMethod, values: Values) -> std::result::Result<(), ()> {
    let (head, rest) = match segments.split_first() {
        Some(split) => split,
        None => {
            return match method {
                AttachMethod::Insert => {
                    target.extend(values);
                    Ok(())
                }
                AttachMethod::Push => Err(()),
            };
        }
    };

    if rest.is_empty() {
        let slot = target.entry(head.to_string()).or_insert_with(|| match method {
            AttachMethod::Push => Value::Array(Vec::new()),
            AttachMethod::Insert => Value::Object(Map::new()),
        });
        return match (method, slot) {
            (AttachMethod::Push, Value::Array(items)) => {
                items.push(Value::Object(values));
                Ok(())
            }
            (AttachMethod::Insert, Value::Object(object)) => {
                object.extend(values);
                Ok(())
            }
            _ => Err(()),
        };
    }

    match target.entry(head.to_string()).or_insert_with(|| Value::Object(Map::new())) {
        Value::Object(child) => attach(child, rest, method, values),
        _ => Err(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::DEFAULT_LANGUAGE;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn plain_parser() -> AnnotationParser {
        AnnotationParser::new(ParseOptions {
            show_private: false,
            markdown: None,
        })
    }

    fn unit(text: &str) -> SourceUnit {
        SourceUnit {
            path: PathBuf::from("src/users.js"),
            text: text.to_string(),
            language: ".js".to_string(),
        }
    }

    fn parse(text: &str) -> Result<Option<ParsedFile>> {
        plain_parser().parse_source(&unit(text))
    }

    #[test]
    fn test_parse_endpoint_block() {
        let src = r#"
/**
 * @api {get} /users/:id Read a user
 * @apiName GetUser
 * @apiGroup User
 * @apiParam {Number} id Users unique ID.
 * @apiSuccess {String} firstname Firstname of the User.
 */
function getUser() {}
"#;
        let parsed = parse(src).unwrap().unwrap();

        assert_eq!(parsed.blocks.len(), 1);
        let block = &parsed.blocks[0];
        assert_eq!(block.index, 1);
        assert!(block.global.is_empty());
        assert_eq!(block.local["type"], "get");
        assert_eq!(block.local["url"], "/users/:id");
        assert_eq!(block.local["name"], "GetUser");
        assert_eq!(block.local["parameter"]["fields"]["Parameter"][0]["field"], "id");
        assert_eq!(block.local["success"]["fields"]["Success 200"][0]["type"], "String");
    }

    #[test]
    fn test_define_block_goes_to_global() {
        let src = "/**\n * @apiDefine Common Shared headers\n * @apiHeader {String} token Access token\n */";
        let parsed = parse(src).unwrap().unwrap();

        let block = &parsed.blocks[0];
        assert_eq!(block.global["define"]["name"], "Common");
        assert_eq!(block.local["header"]["fields"]["Header"][0]["field"], "token");
    }

    #[test]
    fn test_file_without_blocks() {
        assert!(parse("function plain() {}").unwrap().is_none());
    }

    #[test]
    fn test_block_without_api_tags_is_skipped() {
        let src = "/**\n * Regular doc comment.\n * @param x value\n */";
        assert!(parse(src).unwrap().is_none());
    }

    #[test]
    fn test_api_ignore_drops_block() {
        let src = "/**\n * @apiIgnore Not finished\n * @api {get} /draft Draft\n */\n/**\n * @api {get} /done Done\n */";
        let parsed = parse(src).unwrap().unwrap();

        assert_eq!(parsed.blocks.len(), 1);
        assert_eq!(parsed.blocks[0].local["url"], "/done");
        assert_eq!(parsed.blocks[0].index, 2);
    }

    #[test]
    fn test_api_private_respects_option() {
        let src = "/**\n * @api {get} /secret Secret\n * @apiPrivate\n */";
        assert!(parse(src).unwrap().is_none());

        let mut parser = AnnotationParser::new(ParseOptions {
            show_private: true,
            markdown: None,
        });
        let parsed = parser.parse_source(&unit(src)).unwrap().unwrap();
        assert_eq!(parsed.blocks[0].local["private"], true);
    }

    #[test]
    fn test_unknown_tag_is_skipped() {
        let src = "/**\n * @api {get} /a A\n * @apiUnknownThing value\n */";
        let parsed = parse(src).unwrap().unwrap();
        assert_eq!(parsed.blocks[0].local["url"], "/a");
    }

    #[test]
    fn test_two_definitions_in_one_block() {
        let src = "/**\n * @apiDefine First\n * @apiDefine Second\n */\n/**\n * @apiDefine Third\n * @apiDefine Fourth\n */";
        let err = parse(src).unwrap_err();

        match err {
            Error::ElementParsing { message, block, element, .. } => {
                assert_eq!(message, "Only one definition is allowed in the same block.");
                assert_eq!(block, 1);
                assert_eq!(element, "apiDefine");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_use_inside_definition_block() {
        let src = "/**\n * @apiDefine Outer\n * @apiUse Inner\n */";
        let err = parse(src).unwrap_err();
        assert!(err.to_string().starts_with("Only one definition or usage is allowed in the same block."));
    }

    #[test]
    fn test_empty_parser_result() {
        let src = "/**\n * @api {get} /a A\n * @apiGroup\n */";
        let err = parse(src).unwrap_err();
        assert!(err.to_string().starts_with("Empty parser result."));
    }

    #[test]
    fn test_parameter_error_carries_hints() {
        let src = "/**\n * @api {get} /a A\n * @apiVersion one\n */";
        match parse(src).unwrap_err() {
            Error::ElementParsing { message, usage, example, source_text, .. } => {
                assert_eq!(message, "Version format not valid.");
                assert_eq!(usage.as_deref(), Some("@apiVersion major.minor.patch"));
                assert_eq!(example.as_deref(), Some("@apiVersion 1.2.3"));
                assert_eq!(source_text, "@apiVersion one");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_version_extends_root() {
        let src = "/**\n * @api {get} /a A\n * @apiVersion 1.2.0\n */";
        let parsed = parse(src).unwrap().unwrap();

        assert_eq!(parsed.blocks[0].version(), Some("1.2.0"));
        assert_eq!(parsed.blocks[0].local["version"], "1.2.0");
    }

    #[test]
    fn test_current_group_selects_field_path() {
        let src = "/**\n * @api {post} /login Login\n * @apiParam (Login) {String} user\n * @apiParam {String} pass\n */";
        let parsed = parse(src).unwrap().unwrap();

        let fields = &parsed.blocks[0].local["parameter"]["fields"];
        assert_eq!(fields["Login"][0]["field"], "user");
        assert_eq!(fields["Parameter"][0]["field"], "pass");
    }

    #[test]
    fn test_markdown_fields_are_rendered() {
        let src = "/**\n * @api {get} /a A\n * @apiDescription Returns **all** users.\n * @apiParam {String} id The *id*.\n */";
        let mut parser = AnnotationParser::new(ParseOptions::default());
        let parsed = parser.parse_source(&unit(src)).unwrap().unwrap();

        let local = &parsed.blocks[0].local;
        assert_eq!(local["description"], "<p>Returns <strong>all</strong> users.</p>");
        assert_eq!(local["parameter"]["fields"]["Parameter"][0]["description"], "<p>The <em>id</em>.</p>");
        assert_eq!(local["parameter"]["fields"]["Parameter"][0]["type"], "String");
    }

    #[test]
    fn test_other_language_uses_own_syntax() {
        let mut parser = plain_parser();
        let unit = SourceUnit {
            path: PathBuf::from("app.rb"),
            text: "=begin\n@api {get} /ruby Ruby\n=end\n".to_string(),
            language: ".rb".to_string(),
        };
        let parsed = parser.parse_source(&unit).unwrap().unwrap();
        assert_eq!(parsed.blocks[0].local["url"], "/ruby");
    }

    #[test]
    fn test_custom_parser_registration() {
        struct Permission;
        impl FieldParser for Permission {
            fn parse(&self, content: &str, _source: &str, _ctx: &mut ParseContext) -> std::result::Result<Option<Values>, ParameterError> {
                let mut values = Values::new();
                values.insert("name".to_string(), json!(content));
                Ok(Some(values))
            }
            fn path(&self, _ctx: &ParseContext) -> String {
                "local.permission".to_string()
            }
        }

        let mut parser = plain_parser();
        parser.add_parser("apiPermission", Box::new(Permission));
        let parsed = parser
            .parse_source(&unit("/**\n * @api {get} /a A\n * @apiPermission admin\n */"))
            .unwrap()
            .unwrap();

        assert_eq!(parsed.blocks[0].local["permission"], json!([{"name": "admin"}]));
    }

    #[test]
    fn test_attach_rejects_wrong_shape() {
        let mut target = Map::new();
        target.insert("use".to_string(), json!("scalar"));
        let result = attach(&mut target, &["use"], AttachMethod::Push, Values::new());
        assert!(result.is_err());
    }

    #[test]
    fn test_default_language_fallback() {
        let mut parser = plain_parser();
        let unit = SourceUnit {
            path: PathBuf::from("Handler.java"),
            text: "/**\n * @api {delete} /j J\n */".to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
        };
        assert!(parser.parse_source(&unit).unwrap().is_some());
    }

    #[test]
    fn test_deprecation_counted_per_spelling() {
        let src = "/**\n * @apiDefineErrorStructure First\n */\n\
                   /**\n * @apiDefineErrorStructure Second\n */\n\
                   /**\n * @apiDefineSuccessStructure Third\n */";
        let mut parser = plain_parser();
        parser.parse_source(&unit(src)).unwrap();

        assert_eq!(parser.deprecations["apiDefineErrorStructure"], 2);
        assert_eq!(parser.deprecations["apiDefineSuccessStructure"], 1);
    }

    #[test]
    fn test_deprecation_warns_only_first_time() {
        let parser = plain_parser();
        let structure = parser.parsers["apidefineerrorstructure"].as_ref();
        let element = Element {
            source_name: "apiDefineErrorStructure".to_string(),
            name: "apidefineerrorstructure".to_string(),
            content: "First".to_string(),
            source: "@apiDefineErrorStructure First".to_string(),
        };
        let mut counts = HashMap::new();
        let file = Path::new("src/users.js");

        assert!(report_deprecation(&mut counts, structure, &element, file, 0));
        assert!(!report_deprecation(&mut counts, structure, &element, file, 1));
        assert!(!report_deprecation(&mut counts, structure, &element, file, 2));
        assert_eq!(counts["apiDefineErrorStructure"], 3);
    }
}
