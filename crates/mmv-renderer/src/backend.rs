//! Render backend trait for format-specific rendering.
//!
//! The generic renderer handles document structure (lists, tables, inline
//! formatting, block capture) and delegates element markup that differs between
//! output flavors to a backend.

use pulldown_cmark::BlockQuoteKind;

/// GitHub-style alert kinds (`> [!NOTE]` and friends).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlertKind {
    Note,
    Tip,
    Important,
    Warning,
    Caution,
}

impl From<BlockQuoteKind> for AlertKind {
    fn from(kind: BlockQuoteKind) -> Self {
        match kind {
            BlockQuoteKind::Note => Self::Note,
            BlockQuoteKind::Tip => Self::Tip,
            BlockQuoteKind::Important => Self::Important,
            BlockQuoteKind::Warning => Self::Warning,
            BlockQuoteKind::Caution => Self::Caution,
        }
    }
}

/// Backend trait for format-specific rendering operations.
pub trait RenderBackend {
    /// Render a code block.
    ///
    /// # Arguments
    ///
    /// * `lang` - Optional language identifier (e.g., "rust", "python")
    /// * `content` - The code content
    /// * `out` - Output buffer to write to
    fn code_block(lang: Option<&str>, content: &str, out: &mut String);

    /// Render blockquote start tag.
    fn blockquote_start(out: &mut String);

    /// Render blockquote end tag.
    fn blockquote_end(out: &mut String);

    /// Render the opening of an alert box.
    fn alert_start(kind: AlertKind, out: &mut String);

    /// Render the closing of an alert box.
    fn alert_end(kind: AlertKind, out: &mut String);

    /// Render an image.
    ///
    /// `src` is `None` when the original source was rejected by the URL
    /// policy; the image is still emitted so its alt text survives.
    fn image(src: Option<&str>, alt: &str, title: &str, out: &mut String);

    /// Render an opening anchor tag. `href` is `None` for rejected URLs.
    fn link_start(href: Option<&str>, title: &str, out: &mut String);

    /// Render a footnote reference marker.
    fn footnote_reference(label: &str, id: &str, out: &mut String);

    /// Render the opening of a footnote definition carrying `id`.
    fn footnote_definition_start(label: &str, id: &str, out: &mut String);

    /// Render the closing of a footnote definition.
    fn footnote_definition_end(out: &mut String);

    /// Render a hard break.
    fn hard_break(out: &mut String) {
        out.push_str("<br>");
    }

    /// Render a horizontal rule.
    fn horizontal_rule(out: &mut String) {
        out.push_str("<hr>");
    }

    /// Render a task list marker.
    fn task_list_marker(checked: bool, out: &mut String) {
        if checked {
            out.push_str(r#"<input type="checkbox" checked disabled> "#);
        } else {
            out.push_str(r#"<input type="checkbox" disabled> "#);
        }
    }
}
