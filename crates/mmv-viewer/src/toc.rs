//! Table of contents for the current document.

use mmv_renderer::{BlockKind, slugify};

use crate::document::{ElementId, RenderedDocument};

/// One outline line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TocEntry {
    /// Heading level (1-6).
    pub level: u8,
    pub text: String,
    /// Heading identifier.
    pub id: String,
    pub element: ElementId,
}

impl TocEntry {
    /// Indentation depth; top-level headings have none.
    pub fn indent(&self) -> usize {
        usize::from(self.level.saturating_sub(1))
    }
}

/// Flat, indent-by-level outline of a document's headings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableOfContents {
    entries: Vec<TocEntry>,
}

impl TableOfContents {
    /// Build the outline, assigning a slug to any heading without an id.
    ///
    /// Rebuilding on the same document yields the same outline.
    pub fn build(document: &mut RenderedDocument) -> Self {
        let entries = document
            .elements_mut()
            .iter_mut()
            .enumerate()
            .filter_map(|(index, block)| {
                let BlockKind::Heading(level) = block.kind else {
                    return None;
                };
                let id = block
                    .id
                    .get_or_insert_with(|| slugify(&block.text))
                    .clone();
                Some(TocEntry {
                    level,
                    text: block.text.clone(),
                    id,
                    element: ElementId(index),
                })
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[TocEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Heading ids in document order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::ViewerConfig;
    use crate::document::render_document;
    use crate::manifest::ManifestEntry;

    fn document(text: &str) -> RenderedDocument {
        let config = ViewerConfig::new("https://raw.example.com/");
        render_document(
            ManifestEntry::same_origin("a.md"),
            "https://raw.example.com/a.md".to_owned(),
            text,
            &config,
        )
    }

    #[test]
    fn test_outline() {
        let mut doc = document("# Guide\n\n## Install {#setup}\n\n### On Linux\n\ntext\n\n## Usage\n");
        let toc = TableOfContents::build(&mut doc);

        let outline: Vec<_> = toc
            .entries()
            .iter()
            .map(|e| (e.indent(), e.id.as_str(), e.text.as_str()))
            .collect();
        assert_eq!(
            outline,
            vec![
                (0, "guide", "Guide"),
                (1, "setup", "Install"),
                (2, "on-linux", "On Linux"),
                (1, "usage", "Usage"),
            ]
        );
        assert_eq!(toc.entries()[2].element, ElementId(2));
    }

    #[test]
    fn test_rebuild_is_identical() {
        let mut doc = document("# A\n\n## B\n\n## B\n");
        let first = TableOfContents::build(&mut doc);
        let second = TableOfContents::build(&mut doc);
        assert_eq!(first, second);
        assert_eq!(first.ids().collect::<Vec<_>>(), vec!["a", "b", "b-1"]);
    }

    #[test]
    fn test_missing_ids_assigned() {
        let mut doc = document("# Intro\n");
        doc.elements_mut()[0].id = None;
        let toc = TableOfContents::build(&mut doc);
        assert_eq!(toc.entries()[0].id, "intro");
        assert_eq!(doc.elements()[0].id.as_deref(), Some("intro"));
    }

    #[test]
    fn test_no_headings() {
        let mut doc = document("just text\n");
        assert!(TableOfContents::build(&mut doc).is_empty());
    }
}
