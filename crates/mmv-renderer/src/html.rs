//! HTML backend for markdown rendering.
//!
//! Produces semantic HTML5 output for the viewer's content region.

use std::fmt::Write;

use crate::backend::{AlertKind, RenderBackend};
use crate::state::escape_html;

/// HTML render backend.
///
/// Produces semantic HTML5 with:
/// - `<pre><code>` for code blocks
/// - `<blockquote>` for blockquotes, `<div class="alert">` for GFM alerts
/// - `<img>` for images
/// - footnote definitions as identified `<div>` elements
pub struct HtmlBackend;

impl RenderBackend for HtmlBackend {
    fn code_block(lang: Option<&str>, content: &str, out: &mut String) {
        if let Some(lang) = lang {
            write!(
                out,
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                escape_html(lang),
                escape_html(content)
            )
            .unwrap();
        } else {
            write!(out, "<pre><code>{}</code></pre>", escape_html(content)).unwrap();
        }
    }

    fn blockquote_start(out: &mut String) {
        out.push_str("<blockquote>");
    }

    fn blockquote_end(out: &mut String) {
        out.push_str("</blockquote>");
    }

    fn alert_start(kind: AlertKind, out: &mut String) {
        let (class, title) = match kind {
            AlertKind::Note => ("note", "Note"),
            AlertKind::Tip => ("tip", "Tip"),
            AlertKind::Important => ("important", "Important"),
            AlertKind::Warning => ("warning", "Warning"),
            AlertKind::Caution => ("caution", "Caution"),
        };
        write!(
            out,
            r#"<div class="alert alert-{class}"><p class="alert-title">{title}</p>"#
        )
        .unwrap();
    }

    fn alert_end(_kind: AlertKind, out: &mut String) {
        out.push_str("</div>");
    }

    fn image(src: Option<&str>, alt: &str, title: &str, out: &mut String) {
        out.push_str("<img");
        if let Some(src) = src {
            write!(out, r#" src="{}""#, escape_html(src)).unwrap();
        }
        if !title.is_empty() {
            write!(out, r#" title="{}""#, escape_html(title)).unwrap();
        }
        write!(out, r#" alt="{}">"#, escape_html(alt)).unwrap();
    }

    fn link_start(href: Option<&str>, title: &str, out: &mut String) {
        out.push_str("<a");
        if let Some(href) = href {
            write!(out, r#" href="{}""#, escape_html(href)).unwrap();
        }
        if !title.is_empty() {
            write!(out, r#" title="{}""#, escape_html(title)).unwrap();
        }
        out.push('>');
    }

    fn footnote_reference(label: &str, id: &str, out: &mut String) {
        write!(
            out,
            r##"<sup class="footnote-ref"><a href="#{id}">{}</a></sup>"##,
            escape_html(label)
        )
        .unwrap();
    }

    fn footnote_definition_start(label: &str, id: &str, out: &mut String) {
        write!(
            out,
            r#"<div class="footnote-definition" id="{id}"><sup class="footnote-label">{}</sup>"#,
            escape_html(label)
        )
        .unwrap();
    }

    fn footnote_definition_end(out: &mut String) {
        out.push_str("</div>");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_block_with_language() {
        let mut out = String::new();
        HtmlBackend::code_block(Some("sh"), "make install", &mut out);
        assert_eq!(
            out,
            r#"<pre><code class="language-sh">make install</code></pre>"#
        );
    }

    #[test]
    fn test_code_block_escapes_content() {
        let mut out = String::new();
        HtmlBackend::code_block(None, "<b>not bold</b>", &mut out);
        assert_eq!(out, "<pre><code>&lt;b&gt;not bold&lt;/b&gt;</code></pre>");
    }

    #[test]
    fn test_image_with_title() {
        let mut out = String::new();
        HtmlBackend::image(Some("https://x/a.png"), "Diagram", "Overview", &mut out);
        assert_eq!(
            out,
            r#"<img src="https://x/a.png" title="Overview" alt="Diagram">"#
        );
    }

    #[test]
    fn test_image_without_src() {
        let mut out = String::new();
        HtmlBackend::image(None, "blocked", "", &mut out);
        assert_eq!(out, r#"<img alt="blocked">"#);
    }

    #[test]
    fn test_link_start() {
        let mut out = String::new();
        HtmlBackend::link_start(Some("https://x/setup.md?a=1&b=2"), "", &mut out);
        assert_eq!(out, r#"<a href="https://x/setup.md?a=1&amp;b=2">"#);
    }

    #[test]
    fn test_link_start_without_href() {
        let mut out = String::new();
        HtmlBackend::link_start(None, "Title", &mut out);
        assert_eq!(out, r#"<a title="Title">"#);
    }

    #[test]
    fn test_alert_wraps_content() {
        let mut out = String::new();
        HtmlBackend::alert_start(AlertKind::Warning, &mut out);
        out.push_str("<p>careful</p>");
        HtmlBackend::alert_end(AlertKind::Warning, &mut out);
        assert_eq!(
            out,
            r#"<div class="alert alert-warning"><p class="alert-title">Warning</p><p>careful</p></div>"#
        );
    }

    #[test]
    fn test_footnote_definition_has_id() {
        let mut out = String::new();
        HtmlBackend::footnote_definition_start("1", "fn-1", &mut out);
        HtmlBackend::footnote_definition_end(&mut out);
        assert_eq!(
            out,
            r#"<div class="footnote-definition" id="fn-1"><sup class="footnote-label">1</sup></div>"#
        );
    }
}
