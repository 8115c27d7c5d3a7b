use crate::language::{Language, LINE_SENTINEL};
use log::debug;

/// Finds the documentation blocks in one file's text.
///
/// Line breaks are normalized and replaced by [`LINE_SENTINEL`] so the
/// language's block pattern can match across lines. For every match the first
/// non-empty capture group is the block body (languages with two alternative
/// comment syntaxes have one group per alternative); real line breaks are then
/// restored and the per-line prefix is stripped.
///
/// A file without any match yields an empty list; callers skip it.
pub fn find_blocks(src: &str, language: &Language) -> Vec<String> {
    let normalized = src.replace("\r\n", "\n").replace('\n', &LINE_SENTINEL.to_string());

    let blocks: Vec<String> = language
        .doc_blocks
        .captures_iter(&normalized)
        .filter_map(|caps| {
            caps.iter()
                .skip(1)
                .flatten()
                .map(|m| m.as_str())
                .find(|body| !body.is_empty())
        })
        .map(|body| {
            let restored = body.replace(LINE_SENTINEL, "\n");
            language.inline.replace_all(&restored, "").into_owned()
        })
        .collect();

    debug!("count blocks: {}", blocks.len());
    blocks
}
