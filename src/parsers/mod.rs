//! Built-in annotation tag parsers.
//!
//! Every tag (`@api`, `@apiParam`, ...) is handled by one [`FieldParser`]
//! implementation registered under the lower-cased tag name. A parser turns the
//! tag content into a JSON object and tells the registry where in the block
//! record that object belongs and how it is attached.

pub mod api;
pub mod define;
pub mod example;
pub mod param;
pub mod simple;

use crate::error::ParameterError;
use serde_json::{Map, Value};

/// Values produced by one tag.
pub type Values = Map<String, Value>;

/// Per-block state shared between the parsers of one block.
///
/// Reset at the start of every block.
#[derive(Debug, Clone, Default)]
pub struct ParseContext {
    /// Group of the last field declaration, used to build its attach path
    pub current_group: Option<String>,
}

/// How parsed values are attached at their path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachMethod {
    /// Append the values to the array at the path
    Push,
    /// Shallow-merge the values into the object at the path
    Insert,
}

/// Parser for one annotation tag.
pub trait FieldParser {
    /// Parses the trimmed tag content.
    ///
    /// `Ok(None)` means the tag produced nothing, which the registry treats as an error.
    fn parse(&self, content: &str, source: &str, ctx: &mut ParseContext) -> Result<Option<Values>, ParameterError>;

    /// Dotted attach path, read after [`FieldParser::parse`] so it may depend on `ctx`.
    fn path(&self, ctx: &ParseContext) -> String;

    fn method(&self) -> AttachMethod {
        AttachMethod::Push
    }

    /// The tag may not share its block with a global definition.
    fn prevent_global(&self) -> bool {
        false
    }

    /// The tag may be inserted into `global` more than once per block.
    fn allow_multiple(&self) -> bool {
        false
    }

    /// The values are also merged into the block root.
    fn extend_root(&self) -> bool {
        false
    }

    /// Dotted value paths rendered as markdown.
    fn markdown_fields(&self) -> &[&'static str] {
        &[]
    }

    /// Subset of the markdown fields whose `<p>` wrappers are removed.
    fn markdown_remove_p_tags(&self) -> &[&'static str] {
        &[]
    }

    fn deprecated(&self) -> bool {
        false
    }

    /// Replacement tag named in the deprecation warning.
    fn alternative(&self) -> Option<&'static str> {
        None
    }
}

/// All built-in parsers keyed by lower-cased tag name, in registration order.
pub fn builtin_parsers() -> Vec<(&'static str, Box<dyn FieldParser>)> {
    use define::{DefineKind, DefineParser};
    use example::ExampleParser;
    use param::{FieldKind, ParamParser};
    use simple::*;

    vec![
        ("api", Box::new(api::ApiParser)),
        ("apidefine", Box::new(DefineParser::new(DefineKind::Define))),
        ("apidefineerrorstructure", Box::new(DefineParser::new(DefineKind::ErrorStructure))),
        ("apidefineheaderstructure", Box::new(DefineParser::new(DefineKind::HeaderStructure))),
        ("apidefinesuccessstructure", Box::new(DefineParser::new(DefineKind::SuccessStructure))),
        ("apideprecated", Box::new(DeprecatedParser)),
        ("apidescription", Box::new(DescriptionParser)),
        ("apierror", Box::new(ParamParser::new(FieldKind::Error))),
        ("apierrorexample", Box::new(ExampleParser::for_fields(FieldKind::Error))),
        ("apierrorstructure", Box::new(StructureUseParser::new(StructureKind::Error))),
        ("apiexample", Box::new(ExampleParser::general())),
        ("apigroup", Box::new(GroupParser)),
        ("apiheader", Box::new(ParamParser::new(FieldKind::Header))),
        ("apiheaderexample", Box::new(ExampleParser::for_fields(FieldKind::Header))),
        ("apiheaderstructure", Box::new(StructureUseParser::new(StructureKind::Header))),
        ("apiname", Box::new(NameParser)),
        ("apiparam", Box::new(ParamParser::new(FieldKind::Parameter))),
        ("apiparamexample", Box::new(ExampleParser::for_fields(FieldKind::Parameter))),
        ("apiprivate", Box::new(PrivateParser)),
        ("apisuccess", Box::new(ParamParser::new(FieldKind::Success))),
        ("apisuccessexample", Box::new(ExampleParser::for_fields(FieldKind::Success))),
        ("apisuccessstructure", Box::new(StructureUseParser::new(StructureKind::Success))),
        ("apiuse", Box::new(UseParser)),
        ("apiversion", Box::new(VersionParser)),
    ]
}

/// Builds a single-entry value map.
pub(crate) fn values_of(key: &str, value: impl Into<Value>) -> Values {
    let mut values = Map::new();
    values.insert(key.to_string(), value.into());
    values
}
