//! The rendered form of a loaded document.

use mmv_renderer::{HtmlBackend, MarkdownRenderer, TextBlock};

use crate::config::ViewerConfig;
use crate::links::{LinkTarget, intercept};
use crate::manifest::ManifestEntry;
use crate::resolver::rewrite_references;

/// Handle to a text-bearing element of the current document.
///
/// Indexes the document's element table; only meaningful for the document it
/// was taken from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(pub usize);

/// A rendered anchor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentLink {
    pub href: String,
    pub text: String,
    /// Set when following the link loads another document in place.
    pub target: Option<LinkTarget>,
}

/// Content currently installed in the viewer.
#[derive(Clone, Debug)]
pub struct RenderedDocument {
    pub entry: ManifestEntry,
    /// URL the text was fetched from.
    pub source_url: String,
    /// Sanitized HTML.
    pub html: String,
    /// First H1 heading.
    pub title: Option<String>,
    elements: Vec<TextBlock>,
    links: Vec<DocumentLink>,
}

impl RenderedDocument {
    pub fn elements(&self) -> &[TextBlock] {
        &self.elements
    }

    pub(crate) fn elements_mut(&mut self) -> &mut [TextBlock] {
        &mut self.elements
    }

    pub fn element(&self, id: ElementId) -> Option<&TextBlock> {
        self.elements.get(id.0)
    }

    /// Element carrying the identifier `anchor`.
    pub fn find_anchor(&self, anchor: &str) -> Option<ElementId> {
        self.elements
            .iter()
            .position(|block| block.id.as_deref() == Some(anchor))
            .map(ElementId)
    }

    pub fn links(&self) -> &[DocumentLink] {
        &self.links
    }

    /// Title to show for the document.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or_else(|| self.entry.label())
    }
}

/// Resolve references in `text`, render it, and collect its links.
pub fn render_document(
    entry: ManifestEntry,
    source_url: String,
    text: &str,
    config: &ViewerConfig,
) -> RenderedDocument {
    let resolved = match entry.origin(&config.raw_root) {
        Some(origin) => rewrite_references(text, &origin),
        None => text.to_owned(),
    };

    let result = MarkdownRenderer::<HtmlBackend>::new()
        .with_title_extraction()
        .with_gfm(config.gfm)
        .with_breaks(config.breaks)
        .render_markdown(&resolved);

    let links = result
        .links
        .into_iter()
        .map(|link| {
            let target = intercept(&link.href, &link.text, &entry, &config.raw_root);
            DocumentLink {
                href: link.href,
                text: link.text,
                target,
            }
        })
        .collect();

    RenderedDocument {
        entry,
        source_url,
        html: result.html,
        title: result.title,
        elements: result.blocks,
        links,
    }
}
