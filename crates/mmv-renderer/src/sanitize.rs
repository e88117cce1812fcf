//! Safe HTML profile for raw HTML embedded in Markdown.
//!
//! Raw HTML is filtered tag by tag:
//! - formatting tags on the allow-list are kept without attributes, except
//!   `href`/`title` on `a` and `src`/`alt`/`title`/`width`/`height` on `img`
//! - `script`, `style` and other active containers are dropped with their content
//! - comments, doctypes and processing instructions are dropped
//! - any other tag is unwrapped (its content is kept)
//!
//! The sanitizer is stateful: a `<script>` opened by one inline HTML event
//! swallows everything until its closing tag, even across events.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::state::{LinkCapture, escape_html};

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^<(/?)([A-Za-z][A-Za-z0-9-]*)((?:\s+[^\s"'>/=]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'=<>`]+))?)*)\s*(/?)>"#,
    )
    .unwrap()
});

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#).unwrap()
});

const ALLOWED_TAGS: &[&str] = &[
    "a", "abbr", "b", "blockquote", "br", "caption", "code", "dd", "del", "details", "div",
    "dl", "dt", "em", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "i", "img", "ins", "kbd", "li",
    "mark", "ol", "p", "pre", "q", "s", "samp", "span", "strike", "strong", "sub", "summary",
    "sup", "table", "tbody", "td", "tfoot", "th", "thead", "tr", "u", "ul", "var",
];

const DROPPED_WITH_CONTENT: &[&str] = &[
    "script", "style", "iframe", "object", "noscript", "template", "textarea",
];

const VOID_TAGS: &[&str] = &["br", "hr", "img", "wbr", "embed"];

const ALLOWED_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

/// Check a link or image target against the URL policy.
///
/// Relative references and `http`, `https`, `mailto` and `tel` URLs are
/// allowed. Returns the trimmed URL, or `None` when it must be dropped.
///
/// # Examples
///
/// ```
/// use mmv_renderer::safe_url;
///
/// assert_eq!(safe_url("docs/setup.md"), Some("docs/setup.md"));
/// assert_eq!(safe_url("https://example.com/a.png"), Some("https://example.com/a.png"));
/// assert_eq!(safe_url("javascript:alert(1)"), None);
/// ```
#[must_use]
pub fn safe_url(url: &str) -> Option<&str> {
    let url = url.trim();
    if url.chars().any(char::is_control) {
        return None;
    }
    match url.find([':', '/', '?', '#']) {
        Some(i) if url.as_bytes()[i] == b':' => {
            let scheme = &url[..i];
            ALLOWED_SCHEMES
                .iter()
                .any(|allowed| scheme.eq_ignore_ascii_case(allowed))
                .then_some(url)
        }
        _ => Some(url),
    }
}

/// Filters raw HTML fragments down to the safe profile.
#[derive(Debug, Default)]
pub struct Sanitizer {
    skipping: Option<&'static str>,
}

impl Sanitizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sanitize a standalone HTML fragment.
    ///
    /// # Examples
    ///
    /// ```
    /// use mmv_renderer::Sanitizer;
    ///
    /// let html = Sanitizer::clean(r#"<p onclick="x()">Hi<script>evil()</script></p>"#);
    /// assert_eq!(html, "<p>Hi</p>");
    /// ```
    #[must_use]
    pub fn clean(html: &str) -> String {
        let mut out = String::with_capacity(html.len());
        Self::new().filter(html, &mut out, &mut LinkCapture::default());
        out
    }

    /// Whether content is currently being dropped (inside `<script>` etc.).
    pub fn is_skipping(&self) -> bool {
        self.skipping.is_some()
    }

    /// Filter `input` into `out`, recording kept anchors in `links`.
    pub(crate) fn filter(&mut self, input: &str, out: &mut String, links: &mut LinkCapture) {
        let mut rest = input;
        while !rest.is_empty() {
            if let Some(name) = self.skipping {
                match find_closing(rest, name) {
                    Some(end) => {
                        self.skipping = None;
                        rest = &rest[end..];
                    }
                    None => return,
                }
                continue;
            }

            let Some(lt) = rest.find('<') else {
                Self::text(rest, out, links);
                return;
            };
            Self::text(&rest[..lt], out, links);
            rest = &rest[lt..];

            if rest.starts_with("<!--") {
                rest = rest.find("-->").map_or("", |end| &rest[end + 3..]);
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                rest = rest.find('>').map_or("", |end| &rest[end + 1..]);
            } else if let Some(caps) = TAG_RE.captures(rest) {
                let len = caps.get(0).map_or(1, |m| m.len());
                self.tag(&caps, out, links);
                rest = &rest[len..];
            } else {
                out.push_str("&lt;");
                rest = &rest[1..];
            }
        }
    }

    fn text(text: &str, out: &mut String, links: &mut LinkCapture) {
        if text.is_empty() {
            return;
        }
        out.push_str(text);
        links.push_text(text);
    }

    fn tag(&mut self, caps: &Captures<'_>, out: &mut String, links: &mut LinkCapture) {
        let closing = !caps[1].is_empty();
        let name = caps[2].to_ascii_lowercase();
        let self_closing = !caps[4].is_empty();

        if closing {
            if ALLOWED_TAGS.contains(&name.as_str()) && !VOID_TAGS.contains(&name.as_str()) {
                out.push_str("</");
                out.push_str(&name);
                out.push('>');
                if name == "a" {
                    links.close();
                }
            }
            return;
        }

        if let Some(dropped) = DROPPED_WITH_CONTENT.iter().find(|t| **t == name) {
            if !self_closing {
                self.skipping = Some(*dropped);
            }
            return;
        }

        if !ALLOWED_TAGS.contains(&name.as_str()) {
            return;
        }

        out.push('<');
        out.push_str(&name);
        let mut href = None;
        for attr in ATTR_RE.captures_iter(&caps[3]) {
            let attr_name = attr[1].to_ascii_lowercase();
            let raw = attr
                .get(2)
                .or_else(|| attr.get(3))
                .or_else(|| attr.get(4))
                .map_or("", |m| m.as_str());
            let value = decode_entities(raw);
            let keep = match (name.as_str(), attr_name.as_str()) {
                ("a", "href") => {
                    href = safe_url(&value).map(str::to_owned);
                    href.clone()
                }
                ("img", "src") => safe_url(&value).map(str::to_owned),
                ("a", "title") | ("img", "alt" | "title") => Some(value),
                ("img", "width" | "height") if value.chars().all(|c| c.is_ascii_digit()) => {
                    Some(value)
                }
                _ => None,
            };
            if let Some(keep) = keep {
                out.push(' ');
                out.push_str(&attr_name);
                out.push_str("=\"");
                out.push_str(&escape_html(&keep));
                out.push('"');
            }
        }
        out.push('>');

        if name == "a" {
            links.open(href.as_deref());
        }
    }
}

/// Find the end of the closing tag for `name`, case-insensitively.
fn find_closing(input: &str, name: &str) -> Option<usize> {
    let lower = input.to_ascii_lowercase();
    let needle = format!("</{name}");
    let start = lower.find(&needle)?;
    let end = lower[start..].find('>')?;
    Some(start + end + 1)
}

fn decode_entities(value: &str) -> String {
    if !value.contains('&') {
        return value.to_owned();
    }
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::RenderedLink;

    #[test]
    fn test_safe_url_schemes() {
        assert_eq!(safe_url("mailto:docs@example.com"), Some("mailto:docs@example.com"));
        assert_eq!(safe_url("TEL:+15551234"), Some("TEL:+15551234"));
        assert_eq!(safe_url("#install"), Some("#install"));
        assert_eq!(safe_url("//cdn.example.com/x.png"), Some("//cdn.example.com/x.png"));
        assert_eq!(safe_url("data:text/html;base64,AAAA"), None);
        assert_eq!(safe_url(" JavaScript:alert(1)"), None);
        assert_eq!(safe_url("java\tscript:alert(1)"), None);
        assert_eq!(safe_url("vbscript:msgbox"), None);
    }

    #[test]
    fn test_safe_url_colon_after_path() {
        assert_eq!(safe_url("docs/a:b.md"), Some("docs/a:b.md"));
        assert_eq!(safe_url("?q=a:b"), Some("?q=a:b"));
    }

    #[test]
    fn test_allowed_tags_lose_attributes() {
        assert_eq!(
            Sanitizer::clean(r#"<div class="x" style="color:red"><em id="e">hi</em></div>"#),
            "<div><em>hi</em></div>"
        );
    }

    #[test]
    fn test_script_dropped_with_content() {
        assert_eq!(
            Sanitizer::clean("<p>a</p><SCRIPT>if (a < b) { x() }</script><p>b</p>"),
            "<p>a</p><p>b</p>"
        );
    }

    #[test]
    fn test_unknown_tags_unwrapped() {
        assert_eq!(
            Sanitizer::clean("<center><font color=red>Hi</font></center>"),
            "Hi"
        );
    }

    #[test]
    fn test_comments_and_doctype_dropped() {
        assert_eq!(Sanitizer::clean("<!DOCTYPE html><!-- note -->text"), "text");
    }

    #[test]
    fn test_event_handlers_removed() {
        assert_eq!(
            Sanitizer::clean(r#"<img src="a.png" onerror="alert(1)" alt="A" width="40">"#),
            r#"<img src="a.png" alt="A" width="40">"#
        );
    }

    #[test]
    fn test_javascript_href_removed() {
        assert_eq!(
            Sanitizer::clean(r#"<a href="javascript:alert(1)" title="t">x</a>"#),
            r#"<a title="t">x</a>"#
        );
    }

    #[test]
    fn test_entity_encoded_href_kept_escaped() {
        assert_eq!(
            Sanitizer::clean(r#"<a href="guide.md?a=1&amp;b=2">x</a>"#),
            r#"<a href="guide.md?a=1&amp;b=2">x</a>"#
        );
    }

    #[test]
    fn test_stray_less_than_escaped() {
        assert_eq!(Sanitizer::clean("1 < 2"), "1 &lt; 2");
    }

    #[test]
    fn test_skip_state_spans_calls() {
        let mut sanitizer = Sanitizer::new();
        let mut links = LinkCapture::default();
        let mut out = String::new();
        sanitizer.filter("<style>", &mut out, &mut links);
        assert!(sanitizer.is_skipping());
        sanitizer.filter("body { color: red }", &mut out, &mut links);
        sanitizer.filter("</style>after", &mut out, &mut links);
        assert!(!sanitizer.is_skipping());
        assert_eq!(out, "after");
    }

    #[test]
    fn test_anchor_links_captured() {
        let mut sanitizer = Sanitizer::new();
        let mut links = LinkCapture::default();
        let mut out = String::new();
        sanitizer.filter(
            r#"<p><a href="setup.md">Setup</a> and <a href="javascript:x()">bad</a></p>"#,
            &mut out,
            &mut links,
        );
        assert_eq!(
            links.finish(),
            vec![RenderedLink {
                href: "setup.md".to_owned(),
                text: "Setup".to_owned(),
            }]
        );
    }
}
