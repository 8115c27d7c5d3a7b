//! String helpers shared by the tag parsers, workers and the schema synthesizer.

use once_cell::sync::Lazy;
use regex::Regex;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Strips the whitespace prefix shared by every non-blank line.
///
/// Blank lines do not take part in computing the prefix. When no common prefix
/// exists the input is returned unchanged.
pub fn unindent(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut prefix: Option<&str> = None;

    for line in lines.iter().filter(|l| !l.trim().is_empty()) {
        let indent_len = line.len() - line.trim_start().len();
        let indent = &line[..indent_len];
        prefix = Some(match prefix {
            None => indent,
            Some(current) => common_prefix(current, indent),
        });
    }

    let prefix = match prefix {
        Some(p) if !p.is_empty() => p,
        _ => return text.to_string(),
    };

    lines
        .iter()
        .map(|line| line.strip_prefix(prefix).unwrap_or_else(|| line.trim_start()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let len = a
        .char_indices()
        .zip(b.chars())
        .take_while(|((_, ca), cb)| ca == cb)
        .last()
        .map(|((i, c), _)| i + c.len_utf8())
        .unwrap_or(0);
    &a[..len]
}

/// Removes anything that looks like an HTML tag.
pub fn remove_tags(text: &str) -> String {
    HTML_TAG.replace_all(text, "").into_owned()
}

/// Upper-cases the first character, leaving the rest untouched.
pub fn upper_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Replaces every character outside `[A-Za-z0-9_]` with `_`.
pub fn replace_non_word(text: &str) -> String {
    text.chars()
        .map(|c| if is_word_char(c) { c } else { '_' })
        .collect()
}

/// Collapses every whitespace run into a single `_`.
pub fn underscore_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('_');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

pub fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
