//! Test doubles for the viewer's collaborators.
//!
//! [`MockFetcher`] serves canned responses and can hold a URL back until the
//! test releases it. [`RecordingSurface`] records every call the viewer makes.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use mmv_renderer::BlockKind;
use tokio::sync::Notify;

use crate::config::Branding;
use crate::document::{ElementId, RenderedDocument};
use crate::error::FetchError;
use crate::fetch::Fetcher;
use crate::surface::RenderSurface;
use crate::theme::Theme;
use crate::toc::TableOfContents;

/// Mock fetcher for testing.
///
/// Unknown URLs answer 404.
///
/// # Example
///
/// ```ignore
/// use mmv_viewer::MockFetcher;
///
/// let fetcher = MockFetcher::new()
///     .with_document("https://raw.example.com/data/manuals.json", "[]")
///     .with_status("https://raw.example.com/broken.md", 500);
/// ```
#[derive(Debug, Default)]
pub struct MockFetcher {
    responses: RwLock<HashMap<String, Result<Vec<u8>, u16>>>,
    requests: RwLock<Vec<String>>,
    gates: RwLock<HashMap<String, Arc<Notify>>>,
}

impl MockFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `text` at `url`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_document(self, url: impl Into<String>, text: &str) -> Self {
        self.with_bytes(url, text.as_bytes().to_vec())
    }

    /// Serve raw bytes at `url`.
    #[must_use]
    pub fn with_bytes(self, url: impl Into<String>, body: Vec<u8>) -> Self {
        self.responses.write().unwrap().insert(url.into(), Ok(body));
        self
    }

    /// Answer `url` with an HTTP error status.
    #[must_use]
    pub fn with_status(self, url: impl Into<String>, status: u16) -> Self {
        self.responses
            .write()
            .unwrap()
            .insert(url.into(), Err(status));
        self
    }

    /// Hold responses for `url` until the returned gate is notified.
    pub fn gate(&self, url: impl Into<String>) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .write()
            .unwrap()
            .insert(url.into(), Arc::clone(&gate));
        gate
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.read().unwrap().clone()
    }

    /// How many times `url` was requested.
    pub fn request_count(&self, url: &str) -> usize {
        self.requests
            .read()
            .unwrap()
            .iter()
            .filter(|requested| *requested == url)
            .count()
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.requests.write().unwrap().push(url.to_owned());

        let gate = self.gates.read().unwrap().get(url).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let response = self.responses.read().unwrap().get(url).cloned();
        match response {
            Some(Ok(body)) => Ok(body),
            Some(Err(status)) => Err(FetchError::Status {
                url: url.to_owned(),
                status,
            }),
            None => Err(FetchError::Status {
                url: url.to_owned(),
                status: 404,
            }),
        }
    }
}

/// What the content region shows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Content {
    #[default]
    Empty,
    Loading,
    Error(String),
    /// Identity of the installed document.
    Document(String),
}

/// A call made on the surface.
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceEvent {
    /// Footer line.
    Branding(String),
    Theme(Theme),
    Drawer(bool),
    Index(Vec<String>),
    Loading,
    Error(String),
    /// Identity of the shown document.
    Document(String),
    /// Outline ids.
    Toc(Vec<String>),
    Active(Option<String>),
    Highlights(Vec<ElementId>),
    ScrollTo(ElementId),
    ScrollTop,
    Fragment(String),
}

/// Surface that records calls instead of drawing.
///
/// Headings are laid out 100 units apart, in document order.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub events: Vec<SurfaceEvent>,
    pub content: Content,
    pub toc: Vec<String>,
    pub active: Option<String>,
    pub highlights: Vec<ElementId>,
    pub fragment: Option<String>,
    pub theme: Option<Theme>,
    pub drawer_open: bool,
    pub index: Vec<String>,
}

impl RecordingSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Error messages shown so far.
    pub fn errors(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SurfaceEvent::Error(message) => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Identities of documents shown so far.
    pub fn documents(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SurfaceEvent::Document(identity) => Some(identity.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Drop recorded events, keeping the current state.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }
}

impl RenderSurface for RecordingSurface {
    fn show_branding(&mut self, branding: &Branding) {
        self.events.push(SurfaceEvent::Branding(branding.footer()));
    }

    fn apply_theme(&mut self, theme: Theme) {
        self.theme = Some(theme);
        self.events.push(SurfaceEvent::Theme(theme));
    }

    fn set_drawer_open(&mut self, open: bool) {
        self.drawer_open = open;
        self.events.push(SurfaceEvent::Drawer(open));
    }

    fn show_index(&mut self, labels: &[String]) {
        self.index = labels.to_vec();
        self.events.push(SurfaceEvent::Index(labels.to_vec()));
    }

    fn show_loading(&mut self) {
        self.content = Content::Loading;
        self.events.push(SurfaceEvent::Loading);
    }

    fn show_error(&mut self, message: &str) {
        self.content = Content::Error(message.to_owned());
        self.events.push(SurfaceEvent::Error(message.to_owned()));
    }

    fn show_document(&mut self, document: &RenderedDocument) {
        let identity = document.entry.identity().to_owned();
        self.content = Content::Document(identity.clone());
        self.highlights.clear();
        self.events.push(SurfaceEvent::Document(identity));
    }

    fn show_toc(&mut self, toc: &TableOfContents) {
        self.toc = toc.ids().map(str::to_owned).collect();
        self.events.push(SurfaceEvent::Toc(self.toc.clone()));
    }

    fn mark_active(&mut self, id: Option<&str>) {
        self.active = id.map(str::to_owned);
        self.events.push(SurfaceEvent::Active(self.active.clone()));
    }

    fn set_highlights(&mut self, elements: &[ElementId]) {
        self.highlights = elements.to_vec();
        self.events.push(SurfaceEvent::Highlights(elements.to_vec()));
    }

    fn scroll_to(&mut self, element: ElementId) {
        self.events.push(SurfaceEvent::ScrollTo(element));
    }

    fn scroll_to_top(&mut self) {
        self.events.push(SurfaceEvent::ScrollTop);
    }

    fn heading_offsets(&self, document: &RenderedDocument) -> Vec<(String, f64)> {
        document
            .elements()
            .iter()
            .filter(|block| matches!(block.kind, BlockKind::Heading(_)))
            .filter_map(|block| block.id.clone())
            .zip((0u32..).map(|n| f64::from(n) * 100.0))
            .collect()
    }

    fn set_fragment(&mut self, fragment: &str) {
        self.fragment = Some(fragment.to_owned());
        self.events.push(SurfaceEvent::Fragment(fragment.to_owned()));
    }
}
