//! Comment syntax per source language.
//!
//! Every language is described by two patterns: one that finds whole
//! documentation blocks in the file text, and one that strips the per-line
//! prefix (`*`, `#`, ...) from the lines of a block. Block patterns run over
//! text whose line breaks were replaced by [`LINE_SENTINEL`], so they can match
//! across lines without a multi-line flag.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use regex::Regex;
use std::path::Path;

/// Stand-in for `\n` while block patterns are matched.
pub const LINE_SENTINEL: char = '\u{FFFF}';

/// Key of the fallback entry, used for every extension without its own entry.
pub const DEFAULT_LANGUAGE: &str = "default";

/// Block and inline patterns of one language.
#[derive(Debug, Clone)]
pub struct Language {
    /// Matches one documentation block; the block body is the first non-empty capture group.
    pub doc_blocks: Regex,
    /// Matches the prefix to strip from each line of a block.
    pub inline: Regex,
}

impl Language {
    pub fn new(doc_blocks: &str, inline: &str) -> Result<Self> {
        Ok(Self {
            doc_blocks: compile(doc_blocks)?,
            inline: compile(inline)?,
        })
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| Error::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Lookup table from language key (lower-cased file extension including the dot) to patterns.
#[derive(Debug, Clone)]
pub struct LanguageTable {
    default: Language,
    languages: IndexMap<String, Language>,
}

// C#, Go, Dart, Java, JavaScript, PHP, TypeScript and everything else doc-block capable.
const DEFAULT_BLOCKS: &str = r"/\*\*\x{FFFF}?(.+?)\x{FFFF}?(?:\s*)?\*/";
const STAR_INLINE: &str = r"(?m)^(\s*)?(\*)[ ]?";
const HASH_INLINE: &str = r"(?m)^(\s*)?(#)[ ]?";

const BUILTIN: &[(&[&str], &str, &str)] = &[
    (&[DEFAULT_LANGUAGE], DEFAULT_BLOCKS, STAR_INLINE),
    (
        &[".ex", ".exs"],
        r#"@apidoc\s*(?:~[sS])?"""\x{FFFF}?(.+?)\x{FFFF}?(?:\s*)?"""|@apidoc\s*(?:~[sS])?'''\x{FFFF}?(.+?)\x{FFFF}?(?:\s*)?'''"#,
        r"(?m)^(\t*)?",
    ),
    (&[".lua"], r"--\[\[\x{FFFF}?(.+?)\x{FFFF}?(?:\s*)?--\]\]", STAR_INLINE),
    (
        &[".pm", ".pl"],
        r"#\*\*\x{FFFF}?(.+?)\x{FFFF}?(?:\s*)?#\*|=pod\x{FFFF}?(.+?)\x{FFFF}?(?:\s*)?=cut",
        HASH_INLINE,
    ),
    (
        &[".rb"],
        r"#\*\*\x{FFFF}?(.+?)\x{FFFF}?(?:\s*)?#\*|=begin\x{FFFF}?(.+?)\x{FFFF}?(?:\s*)?=end",
        HASH_INLINE,
    ),
    (&[".py"], r#""""\x{FFFF}?(.+?)\x{FFFF}?(?:\s*)?""""#, r"(?m)^[ \t]*"),
    (&[".coffee"], r"###\x{FFFF}?(.+?)\x{FFFF}?(?:\s*)?###", HASH_INLINE),
    (&[".erl"], r"%\{\x{FFFF}?(.+?)\x{FFFF}?(?:\s*)?%\}", r"(?m)^(\s*)?(%)[ ]?"),
    (&[".clj"], r";;;;\x{FFFF}?(.+?)\x{FFFF}?(?:\s*)?;;;;", r"(?m)^(\s*)?(;;)[ ]?"),
];

impl LanguageTable {
    /// Creates a table holding the built-in languages.
    pub fn new() -> Self {
        let mut languages = IndexMap::new();
        for (keys, blocks, inline) in BUILTIN {
            // constant patterns, compiled in the tests below
            let language = Language::new(blocks, inline).unwrap();
            for key in keys.iter() {
                languages.insert(key.to_string(), language.clone());
            }
        }
        let default = languages[DEFAULT_LANGUAGE].clone();
        Self { default, languages }
    }

    /// Registers or replaces a language. Keys are lower-cased extensions such as `.rb`.
    pub fn add_language(&mut self, key: &str, language: Language) {
        let key = key.to_lowercase();
        if key == DEFAULT_LANGUAGE {
            self.default = language.clone();
        }
        self.languages.insert(key, language);
    }

    /// Returns the patterns for a language key, falling back to the default entry.
    pub fn get(&self, key: &str) -> &Language {
        self.languages.get(key).unwrap_or(&self.default)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.languages.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.languages.keys().map(String::as_str)
    }
}

impl Default for LanguageTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Derives the language key for a file: its lower-cased extension with a leading dot.
pub fn language_key(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
}
