//! Markdown to sanitized HTML conversion for the multi-manual viewer.
//!
//! This crate provides a generic [`MarkdownRenderer`] that produces HTML
//! through the [`RenderBackend`] trait. Besides the markup itself, a render
//! reports everything the viewer needs to work on the result without
//! re-parsing it:
//!
//! - the text-bearing elements (headings, paragraphs, list items) in document
//!   order, with their identifiers ([`TextBlock`])
//! - every rendered anchor ([`RenderedLink`])
//! - the title from the first H1 heading
//!
//! Raw HTML embedded in the Markdown passes through [`Sanitizer`], which
//! restricts it to a safe formatting profile.
//!
//! # Example
//!
//! ```
//! use mmv_renderer::{HtmlBackend, MarkdownRenderer};
//!
//! let result = MarkdownRenderer::<HtmlBackend>::new()
//!     .with_title_extraction()
//!     .render_markdown("# Hello\n\n**Bold** text");
//!
//! assert_eq!(result.title.as_deref(), Some("Hello"));
//! assert_eq!(result.blocks.len(), 2);
//! ```

mod backend;
mod html;
mod renderer;
mod sanitize;
mod state;
mod util;

pub use backend::{AlertKind, RenderBackend};
pub use html::HtmlBackend;
pub use renderer::{MarkdownRenderer, RenderResult};
pub use sanitize::{Sanitizer, safe_url};
pub use state::{BlockKind, RenderedLink, TextBlock, escape_html, slugify};
