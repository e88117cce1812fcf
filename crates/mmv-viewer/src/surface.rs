//! The rendering surface the viewer drives.

use crate::config::Branding;
use crate::document::{ElementId, RenderedDocument};
use crate::theme::Theme;
use crate::toc::TableOfContents;

/// Presentation capability behind the viewer.
///
/// The viewer owns all state; a surface only displays it and reports layout.
/// Elements are addressed by [`ElementId`] into the current document.
pub trait RenderSurface {
    /// Header logos, company name and footer.
    fn show_branding(&mut self, branding: &Branding);

    fn apply_theme(&mut self, theme: Theme);

    fn set_drawer_open(&mut self, open: bool);

    /// Index of manuals, one label per manifest entry.
    fn show_index(&mut self, labels: &[String]);

    /// Replace the content region with a loading indicator.
    fn show_loading(&mut self);

    /// Replace the content region with an inline error message.
    fn show_error(&mut self, message: &str);

    /// Install a document as the visible content.
    fn show_document(&mut self, document: &RenderedDocument);

    fn show_toc(&mut self, toc: &TableOfContents);

    /// Mark the outline entry for `id` as active (`None` clears).
    fn mark_active(&mut self, id: Option<&str>);

    /// Highlight elements; an empty slice clears all highlights.
    fn set_highlights(&mut self, elements: &[ElementId]);

    /// Scroll `element` into the center of the view.
    fn scroll_to(&mut self, element: ElementId);

    fn scroll_to_top(&mut self);

    /// Vertical offsets of the document's headings, as `(id, offset)` in
    /// document order.
    fn heading_offsets(&self, document: &RenderedDocument) -> Vec<(String, f64)>;

    /// Replace the addressable fragment (with leading `#`).
    fn set_fragment(&mut self, fragment: &str);
}
