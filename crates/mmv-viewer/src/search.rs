//! In-page search over the current document's text.

use crate::document::{ElementId, RenderedDocument};

/// Most elements highlighted by one search.
pub const MAX_HIGHLIGHTS: usize = 50;

/// One searchable element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchIndexEntry {
    pub text: String,
    /// Own id, else the nearest identified ancestor's.
    pub id: Option<String>,
    pub element: ElementId,
    folded: String,
}

/// Result of a search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Empty query: highlights cleared.
    Cleared,
    NoMatch,
    Matches {
        /// Elements to highlight, in document order.
        highlighted: Vec<ElementId>,
        /// Element to scroll into view.
        first: ElementId,
    },
}

/// Flattened text of headings, paragraphs and list items, in document order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchIndex {
    entries: Vec<SearchIndexEntry>,
}

impl SearchIndex {
    pub fn build(document: &RenderedDocument) -> Self {
        let entries = document
            .elements()
            .iter()
            .enumerate()
            .filter(|(_, block)| !block.text.trim().is_empty())
            .map(|(index, block)| SearchIndexEntry {
                text: block.text.clone(),
                id: block.id.clone().or_else(|| block.anchor.clone()),
                element: ElementId(index),
                folded: block.text.to_lowercase(),
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[SearchIndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-insensitive substring search.
    pub fn search(&self, query: &str) -> SearchOutcome {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return SearchOutcome::Cleared;
        }

        let highlighted: Vec<ElementId> = self
            .entries
            .iter()
            .filter(|entry| entry.folded.contains(&query))
            .take(MAX_HIGHLIGHTS)
            .map(|entry| entry.element)
            .collect();

        match highlighted.first() {
            Some(&first) => SearchOutcome::Matches { highlighted, first },
            None => SearchOutcome::NoMatch,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::Write;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::ViewerConfig;
    use crate::document::render_document;
    use crate::manifest::ManifestEntry;

    fn index(text: &str) -> SearchIndex {
        let config = ViewerConfig::new("https://raw.example.com/");
        let doc = render_document(
            ManifestEntry::same_origin("a.md"),
            "https://raw.example.com/a.md".to_owned(),
            text,
            &config,
        );
        SearchIndex::build(&doc)
    }

    #[test]
    fn test_build_captures_ids() {
        let index = index("# Install\n\nRun the installer.\n\n- step one\n");
        let entries: Vec<_> = index
            .entries()
            .iter()
            .map(|e| (e.text.as_str(), e.id.as_deref()))
            .collect();
        assert_eq!(
            entries,
            vec![
                ("Install", Some("install")),
                ("Run the installer.", None),
                ("step one", None),
            ]
        );
    }

    #[test]
    fn test_case_insensitive() {
        let index = index("# Install\n\nRun the INSTALLER.\n\nNothing here.\n");
        assert_eq!(index.search("install"), SearchOutcome::Matches {
            highlighted: vec![ElementId(0), ElementId(1)],
            first: ElementId(0),
        });
    }

    #[test]
    fn test_empty_query_clears() {
        let index = index("# Install\n");
        assert_eq!(index.search(""), SearchOutcome::Cleared);
        assert_eq!(index.search("   "), SearchOutcome::Cleared);
    }

    #[test]
    fn test_no_match() {
        let index = index("# Install\n");
        assert_eq!(index.search("uninstall"), SearchOutcome::NoMatch);
    }

    #[test]
    fn test_highlights_capped() {
        let mut text = String::new();
        for i in 0..80 {
            write!(text, "match {i}\n\n").unwrap();
        }
        let index = index(&text);
        let SearchOutcome::Matches { highlighted, first } = index.search("MATCH") else {
            panic!("expected matches");
        };
        assert_eq!(highlighted.len(), MAX_HIGHLIGHTS);
        assert_eq!(first, ElementId(0));
        assert_eq!(highlighted.last(), Some(&ElementId(49)));
    }

    #[test]
    fn test_footnote_text_uses_anchor() {
        let index = index("Claim[^1].\n\n[^1]: Source text.\n");
        let footnote = index
            .entries()
            .iter()
            .find(|e| e.text == "Source text.")
            .unwrap();
        assert_eq!(footnote.id.as_deref(), Some("fn-1"));
    }
}
