//! Core of the multi-manual documentation viewer.
//!
//! Given a manifest of Markdown documents hosted in the viewer's own
//! repository or elsewhere, this crate fetches, renders and navigates between
//! them, keeping a table of contents and a search index in sync with the
//! current document.
//!
//! # Architecture
//!
//! The crate provides:
//! - [`Manifest`] and [`ManifestEntry`] with an explicit [`DocumentSource`]
//! - [`Origin`] and [`rewrite_references`] for resolving relative links and images
//! - [`Viewer`], which drives a [`RenderSurface`] and discards superseded loads
//! - [`TableOfContents`], [`ScrollSpy`] and [`SearchIndex`], rebuilt per document
//! - [`Fetcher`] with the `ureq` based [`HttpFetcher`]
//! - [`MockFetcher`] and [`RecordingSurface`] for testing (behind `mock` feature flag)
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use mmv_viewer::{FileThemeStore, HttpFetcher, Viewer, ViewerConfig};
//!
//! let config = Arc::new(ViewerConfig::new("https://raw.githubusercontent.com/acme/manuals/main/"));
//! let store = Box::new(FileThemeStore::new(&config.state_file));
//! let viewer = Viewer::new(config, HttpFetcher::new(), surface, store);
//! viewer.start(Some("#manual=docs%2Fhome.md")).await;
//! ```

mod config;
mod document;
mod error;
mod fetch;
mod fragment;
mod links;
mod loader;
mod manifest;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod resolver;
mod search;
mod spy;
mod surface;
mod theme;
mod toc;
mod viewer;

pub use config::{Branding, ViewerConfig, viewer_config_from_mmv_config};
pub use document::{DocumentLink, ElementId, RenderedDocument, render_document};
pub use error::{DocumentLoadError, FetchError, ManifestLoadError, ThemeStoreError};
pub use fetch::{Fetcher, HttpFetcher};
pub use fragment::{encode_fragment, parse_fragment, restore_entry};
pub use links::{LinkTarget, intercept, is_document_link};
pub use loader::{LoadGenerations, LoadTicket, fetch_text};
pub use manifest::{DocumentSource, Manifest, ManifestEntry, load_manifest};
#[cfg(any(test, feature = "mock"))]
pub use mock::{Content, MockFetcher, RecordingSurface, SurfaceEvent};
pub use resolver::{Origin, rewrite_references, url_directory};
pub use search::{MAX_HIGHLIGHTS, SearchIndex, SearchIndexEntry, SearchOutcome};
pub use spy::{ScrollSpy, SpyState, Viewport, active_heading};
pub use surface::RenderSurface;
pub use theme::{FileThemeStore, MemoryThemeStore, THEME_KEY, Theme, ThemeStore};
pub use toc::{TableOfContents, TocEntry};
pub use viewer::{LoadOutcome, StartOutcome, Viewer};
