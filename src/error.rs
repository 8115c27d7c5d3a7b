use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the application
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No input file matched the configured filters.
    #[error("{message}: {}", .path.display())]
    FileDiscovery { path: PathBuf, message: String },

    /// A single tag failed to parse, or a block-level structural rule was violated.
    #[error(
        "{message} (file: {}, block: {block}, element: @{element}){}",
        .file.display(),
        Hints(.usage.as_deref(), .example.as_deref())
    )]
    ElementParsing {
        message: String,
        file: PathBuf,
        block: usize,
        element: String,
        source_text: String,
        usage: Option<String>,
        example: Option<String>,
    },

    /// A worker could not resolve a referenced definition name or version.
    #[error(
        "{message} (file: {}, block: {block}, element: @{element}){}{}",
        .file.display(),
        Extra(.extra),
        Hints(Some(.usage.as_str()), Some(.example.as_str()))
    )]
    CrossReference {
        message: String,
        file: PathBuf,
        block: usize,
        element: String,
        usage: String,
        example: String,
        extra: Vec<(String, String)>,
    },

    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A package or override file exists but is not valid JSON.
    #[error("Can not read: {}, please check the format (e.g. missing comma): {source}", .path.display())]
    PackageFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Validation failure raised by a tag parser.
///
/// The registry re-wraps it into [`Error::ElementParsing`] once the file,
/// block and tag context is known.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParameterError {
    pub message: String,
    pub element: String,
    pub usage: String,
    pub example: String,
}

impl ParameterError {
    pub fn new(message: &str, element: &str, usage: &str, example: &str) -> Self {
        Self {
            message: message.to_string(),
            element: element.to_string(),
            usage: usage.to_string(),
            example: example.to_string(),
        }
    }
}

struct Hints<'a>(Option<&'a str>, Option<&'a str>);

impl fmt::Display for Hints<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(usage) = self.0 {
            write!(f, "\n  usage: {}", usage)?;
        }
        if let Some(example) = self.1 {
            write!(f, "\n  example: {}", example.replace('\n', "\n           "))?;
        }
        Ok(())
    }
}

struct Extra<'a>(&'a [(String, String)]);

impl fmt::Display for Extra<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in self.0 {
            write!(f, "\n  {}: {}", key, value)?;
        }
        Ok(())
    }
}
