use crate::text::is_word_char;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One `@tag content` unit inside a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Tag as written, e.g. `apiParam`
    pub source_name: String,
    /// Lower-cased tag used for the parser lookup
    pub name: String,
    /// Everything after the tag up to the next line-start tag
    pub content: String,
    /// The original `@tag content` text
    pub source: String,
}

/// Observer/mutator invoked while elements are discovered.
///
/// Both callbacks default to doing nothing, so implementors only override what they need.
pub trait ElementHook {
    /// Called for every element right after it was tokenized.
    fn on_element(&self, _element: &mut Element, _block: &str, _filename: &Path) {}

    /// Called with the element list after each element was appended.
    fn on_elements(&self, _elements: &mut Vec<Element>, _block: &str, _filename: &Path) {}
}

/// Splits a block into its ordered elements.
///
/// An element starts at `@` followed by the tag name (`[A-Za-z0-9_]*`) and one
/// optional separating blank. Its content runs until the next line that starts
/// with a tag (only blanks and `*` may precede the `@`) or the end of the block,
/// so multi-line content never swallows the tag on a following line.
pub fn find_elements(block: &str, filename: &Path, hooks: &[Box<dyn ElementHook>]) -> Vec<Element> {
    let mut elements = Vec::new();
    let mut pos = 0;

    while let Some(offset) = block[pos..].find('@') {
        let at = pos + offset;
        let name_start = at + 1;
        let name_end = block[name_start..]
            .find(|c: char| !is_word_char(c))
            .map(|i| name_start + i)
            .unwrap_or(block.len());

        let mut content_start = name_end;
        if let Some(c) = block[name_end..].chars().next() {
            if c.is_whitespace() && c != '\n' {
                content_start += c.len_utf8();
            }
        }

        let end = next_tag_line(block, content_start).unwrap_or(block.len());
        let source_name = &block[name_start..name_end];

        let mut element = Element {
            source_name: source_name.to_string(),
            name: source_name.to_lowercase(),
            content: block[content_start..end].to_string(),
            source: block[at..end].to_string(),
        };

        for hook in hooks {
            hook.on_element(&mut element, block, filename);
        }
        elements.push(element);
        for hook in hooks {
            hook.on_elements(&mut elements, block, filename);
        }

        if end == block.len() {
            break;
        }
        pos = end;
    }

    elements
}

/// Byte offset of the line break that precedes the next line-start tag.
fn next_tag_line(block: &str, from: usize) -> Option<usize> {
    block[from..]
        .match_indices('\n')
        .map(|(i, _)| from + i)
        .find(|&newline| {
            block[newline + 1..]
                .trim_start_matches(|c: char| (c.is_whitespace() && c != '\n') || c == '*')
                .starts_with('@')
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn elements(block: &str) -> Vec<Element> {
        find_elements(block, Path::new("test.js"), &[])
    }

    #[test]
    fn test_single_line_elements() {
        let found = elements("@api {get} /users List users\n@apiName GetUsers\n@apiGroup User");

        assert_eq!(found.len(), 3);
        assert_eq!(found[0].name, "api");
        assert_eq!(found[0].content, "{get} /users List users");
        assert_eq!(found[1].source_name, "apiName");
        assert_eq!(found[1].name, "apiname");
        assert_eq!(found[1].content, "GetUsers");
        assert_eq!(found[2].source, "@apiGroup User");
    }

    #[test]
    fn test_multi_line_content() {
        let found = elements("@apiSuccessExample {json} Success:\n    {\n      \"id\": 1\n    }\n@apiName X");

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].content, "{json} Success:\n    {\n      \"id\": 1\n    }");
        assert_eq!(found[1].content, "X");
    }

    #[test]
    fn test_inline_at_sign_stays_in_content() {
        let found = elements("@apiDescription Contact admin@example.com for access\n@apiName X");

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].content, "Contact admin@example.com for access");
    }

    #[test]
    fn test_empty_tag_does_not_swallow_next_line() {
        let found = elements("@apiPrivate\n@api {get} /secret Secret");

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].name, "apiprivate");
        assert_eq!(found[0].content, "");
        assert_eq!(found[1].name, "api");
    }

    #[test]
    fn test_blank_lines_between_tags() {
        let found = elements("@apiName A\n\n@apiGroup B");

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].content, "A\n");
        assert_eq!(found[1].content, "B");
    }

    #[test]
    fn test_asterisk_prefixed_tag_line() {
        let found = elements("@apiName A\n * @apiGroup B");

        assert_eq!(found.len(), 2);
        assert_eq!(found[1].name, "apigroup");
    }

    #[test]
    fn test_whitespace_only_block() {
        assert!(elements("   \n  \n").is_empty());
    }

    struct Recorder {
        seen: RefCell<Vec<String>>,
    }

    impl ElementHook for Recorder {
        fn on_element(&self, element: &mut Element, _block: &str, _filename: &Path) {
            self.seen.borrow_mut().push(element.name.clone());
            if element.name == "apititle" {
                element.name = "apiname".to_string();
            }
        }
    }

    #[test]
    fn test_hooks_observe_and_mutate() {
        let recorder = Recorder { seen: RefCell::new(Vec::new()) };
        let hooks: Vec<Box<dyn ElementHook>> = vec![Box::new(recorder)];

        let found = find_elements("@apiTitle A\n@apiGroup B", Path::new("x.js"), &hooks);

        assert_eq!(found[0].name, "apiname");
        assert_eq!(found[0].source_name, "apiTitle");
    }
}
