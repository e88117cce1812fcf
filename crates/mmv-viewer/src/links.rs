//! In-document link interception.
//!
//! A rendered anchor whose target names a Markdown document becomes a
//! synthesized [`ManifestEntry`] that the viewer loads in place instead of
//! leaving the shell.

use std::sync::LazyLock;

use regex::Regex;

use crate::manifest::{DocumentSource, ManifestEntry};
use crate::resolver::url_directory;

/// Document-file suffix, optionally followed by a fragment or query.
static DOC_LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.md($|#|\?)").unwrap());

static ABSOLUTE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^(https?:)?//").unwrap());

/// Where an intercepted link leads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkTarget {
    /// Entry to load.
    pub entry: ManifestEntry,
    /// Heading to scroll to once loaded.
    pub anchor: Option<String>,
}

/// Whether `href` looks like a link to a Markdown document.
pub fn is_document_link(href: &str) -> bool {
    DOC_LINK_RE.is_match(href)
}

/// Turn a rendered link into a load target.
///
/// `href` has normally been resolved already. Targets that are still relative
/// (raw HTML anchors, or documents without an origin) are resolved against
/// the current entry's origin; if it has none the link is left alone.
pub fn intercept(
    href: &str,
    text: &str,
    current: &ManifestEntry,
    raw_root: &str,
) -> Option<LinkTarget> {
    if !is_document_link(href) {
        return None;
    }

    let absolute = if ABSOLUTE_RE.is_match(href) {
        if href.starts_with("//") {
            format!("https:{href}")
        } else {
            href.to_owned()
        }
    } else if href.starts_with('#') {
        return None;
    } else {
        current.origin(raw_root)?.resolve(href).into_owned()
    };
    if !ABSOLUTE_RE.is_match(&absolute) {
        return None;
    }

    let (location, anchor) = match absolute.split_once('#') {
        Some((location, anchor)) => (location, Some(anchor).filter(|a| !a.is_empty())),
        None => (absolute.as_str(), None),
    };

    let source = match location.strip_prefix(raw_root) {
        Some(path) if !path.is_empty() => DocumentSource::SameOrigin {
            path: path.to_owned(),
        },
        _ => DocumentSource::External {
            url: location.to_owned(),
            base: Some(url_directory(location).to_owned()),
        },
    };

    let mut entry = ManifestEntry {
        title: None,
        source,
    };
    let title = text.trim();
    entry.title = Some(if title.is_empty() {
        entry.identity().to_owned()
    } else {
        title.to_owned()
    });

    Some(LinkTarget {
        entry,
        anchor: anchor.map(str::to_owned),
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const ROOT: &str = "https://raw.githubusercontent.com/acme/manuals/main/";

    fn home() -> ManifestEntry {
        ManifestEntry::same_origin("docs/home.md").with_title("Home")
    }

    #[test]
    fn test_document_link_pattern() {
        assert!(is_document_link("guide.md"));
        assert!(is_document_link("guide.md#install"));
        assert!(is_document_link("guide.md?plain=1"));
        assert!(!is_document_link("guide.mdx"));
        assert!(!is_document_link("image.png"));
        assert!(!is_document_link("https://example.com/"));
    }

    #[test]
    fn test_same_origin_link() {
        let href = format!("{ROOT}docs/guide/setup.md");
        let target = intercept(&href, "Setup", &home(), ROOT).unwrap();
        assert_eq!(target, LinkTarget {
            entry: ManifestEntry::same_origin("docs/guide/setup.md").with_title("Setup"),
            anchor: None,
        });
    }

    #[test]
    fn test_anchor_split_off() {
        let href = format!("{ROOT}docs/guide.md#install");
        let target = intercept(&href, "Install", &home(), ROOT).unwrap();
        assert_eq!(target.entry.identity(), "docs/guide.md");
        assert_eq!(target.anchor.as_deref(), Some("install"));
    }

    #[test]
    fn test_external_link_gets_directory_base() {
        let target =
            intercept("https://host/pkg/docs/api.md", "API", &home(), ROOT).unwrap();
        assert_eq!(
            target.entry,
            ManifestEntry::external("https://host/pkg/docs/api.md", Some("https://host/pkg/docs/".to_owned()))
                .with_title("API")
        );
    }

    #[test]
    fn test_protocol_relative_link() {
        let target = intercept("//host/a.md", "A", &home(), ROOT).unwrap();
        assert_eq!(target.entry.identity(), "https://host/a.md");
    }

    #[test]
    fn test_relative_link_resolved_against_current() {
        let target = intercept("../api.md", "", &home(), ROOT).unwrap();
        assert_eq!(target.entry, ManifestEntry::same_origin("api.md").with_title("api.md"));
    }

    #[test]
    fn test_relative_link_in_external_without_base() {
        let current = ManifestEntry::external("https://host/readme.md", None);
        assert!(intercept("other.md", "Other", &current, ROOT).is_none());
    }

    #[test]
    fn test_relative_link_in_external_with_base() {
        let current = ManifestEntry::external(
            "https://host/pkg/readme.md",
            Some("https://host/pkg/".to_owned()),
        );
        let target = intercept("docs/other.md#top", "Other", &current, ROOT).unwrap();
        assert_eq!(target.entry.identity(), "https://host/pkg/docs/other.md");
        assert_eq!(target.anchor.as_deref(), Some("top"));
    }

    #[test]
    fn test_non_document_links_ignored() {
        assert!(intercept("https://example.com/", "x", &home(), ROOT).is_none());
        assert!(intercept(&format!("{ROOT}images/a.png"), "x", &home(), ROOT).is_none());
        assert!(intercept("mailto:docs@example.com", "x", &home(), ROOT).is_none());
        assert!(intercept("ftp://host/notes.md", "x", &home(), ROOT).is_none());
    }

    #[test]
    fn test_empty_text_uses_identity() {
        let href = format!("{ROOT}docs/faq.md");
        let target = intercept(&href, "  ", &home(), ROOT).unwrap();
        assert_eq!(target.entry.label(), "docs/faq.md");
    }
}
