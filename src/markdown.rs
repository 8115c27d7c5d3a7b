use comrak::{markdown_to_html, Options};

/// Renders markdown text of selected tag fields into HTML.
pub trait MarkdownRenderer {
    fn render(&self, text: &str) -> String;
}

/// GitHub flavoured CommonMark renderer backed by `comrak`.
///
/// Raw HTML inside descriptions is passed through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommonMarkRenderer;

impl CommonMarkRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl MarkdownRenderer for CommonMarkRenderer {
    fn render(&self, text: &str) -> String {
        let mut options = Options::default();
        options.extension.table = true;
        options.extension.strikethrough = true;
        options.extension.autolink = true;
        options.render.unsafe_ = true;
        markdown_to_html(text, &options)
    }
}

/// Post-processing applied to every rendered field: line breaks become
/// spaces, the result is trimmed and `<p>` wrappers are optionally dropped.
pub fn render_field(renderer: &dyn MarkdownRenderer, text: &str, remove_p_tags: bool) -> String {
    let html = renderer.render(text);
    let flat = html.replace("\r\n", " ").replace(['\n', '\r'], " ");
    let trimmed = flat.trim();
    if remove_p_tags {
        trimmed.replace("<p>", "").replace("</p>", "")
    } else {
        trimmed.to_string()
    }
}
