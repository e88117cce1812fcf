//! The viewer shell: ties manifest, loader, outline, search and theme to a
//! rendering surface.
//!
//! All operations take `&self` and run on one thread. Loads may overlap: each
//! takes a [`LoadTicket`](crate::LoadTicket) when it starts and only the
//! newest one installs its result. No `RefCell` borrow is held across an
//! `.await`.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::sync::Arc;

use crate::config::ViewerConfig;
use crate::document::{DocumentLink, RenderedDocument, render_document};
use crate::error::{DocumentLoadError, ManifestLoadError};
use crate::fetch::Fetcher;
use crate::fragment::{encode_fragment, parse_fragment, restore_entry};
use crate::loader::{LoadGenerations, fetch_text};
use crate::manifest::{Manifest, ManifestEntry, load_manifest};
use crate::search::{SearchIndex, SearchOutcome};
use crate::spy::{ScrollSpy, Viewport};
use crate::surface::RenderSurface;
use crate::theme::{Theme, ThemeStore};
use crate::toc::TableOfContents;

/// Result of a document load.
#[derive(Debug)]
pub enum LoadOutcome {
    /// Installed as the current document.
    Loaded,
    /// A newer load started while this one was in flight; result discarded.
    Superseded,
    /// Shown as an inline error.
    Failed(DocumentLoadError),
}

/// Result of starting the viewer.
#[derive(Debug)]
pub enum StartOutcome {
    /// Manifest could not be loaded; shown as an inline error.
    ManifestFailed(ManifestLoadError),
    /// Manifest has no entries and no document was restored.
    Empty,
    /// Initial document load ran.
    Started(LoadOutcome),
}

/// State derived from the current document.
struct Current {
    document: RenderedDocument,
    toc: TableOfContents,
    search: SearchIndex,
    spy: ScrollSpy,
    generation: u64,
}

/// Multi-manual viewer.
pub struct Viewer<F: Fetcher, S: RenderSurface> {
    config: Arc<ViewerConfig>,
    fetcher: F,
    surface: RefCell<S>,
    themes: Box<dyn ThemeStore>,
    manifest: RefCell<Manifest>,
    current: RefCell<Option<Current>>,
    generations: LoadGenerations,
    theme: Cell<Theme>,
    drawer_open: Cell<bool>,
    viewport: Cell<Viewport>,
    marked: RefCell<Option<String>>,
}

impl<F: Fetcher, S: RenderSurface> Viewer<F, S> {
    pub fn new(
        config: Arc<ViewerConfig>,
        fetcher: F,
        surface: S,
        themes: Box<dyn ThemeStore>,
    ) -> Self {
        Self {
            config,
            fetcher,
            surface: RefCell::new(surface),
            themes,
            manifest: RefCell::new(Manifest::default()),
            current: RefCell::new(None),
            generations: LoadGenerations::new(),
            theme: Cell::new(Theme::default()),
            drawer_open: Cell::new(false),
            viewport: Cell::new(Viewport::default()),
            marked: RefCell::new(None),
        }
    }

    /// Show branding, apply the saved theme, load the manifest and the
    /// initial document.
    ///
    /// The initial document is the one named by `fragment` (`#manual=…`),
    /// else the first manifest entry.
    pub async fn start(&self, fragment: Option<&str>) -> StartOutcome {
        let theme = self.saved_theme();
        self.theme.set(theme);
        {
            let mut surface = self.surface.borrow_mut();
            surface.show_branding(&self.config.branding);
            surface.apply_theme(theme);
            surface.set_drawer_open(self.drawer_open.get());
        }

        let manifest = match load_manifest(&self.fetcher, &self.config.manifest_url).await {
            Ok(manifest) => manifest,
            Err(err) => {
                tracing::warn!(url = %self.config.manifest_url, error = %err, "Failed to load manifest");
                self.surface
                    .borrow_mut()
                    .show_error(&format!("Error loading manifest: {err}"));
                return StartOutcome::ManifestFailed(err);
            }
        };
        self.surface.borrow_mut().show_index(&manifest.labels());

        let restored = fragment
            .and_then(parse_fragment)
            .map(|key| restore_entry(&key, &manifest));
        if let Some(entry) = &restored {
            tracing::info!(manual = entry.identity(), "Restoring manual from fragment");
        }
        let initial = restored.or_else(|| manifest.first().cloned());
        *self.manifest.borrow_mut() = manifest;

        match initial {
            Some(entry) => StartOutcome::Started(self.load(entry, None).await),
            None => {
                tracing::info!("Manifest is empty");
                StartOutcome::Empty
            }
        }
    }

    /// Fetch, render and install `entry`, then scroll to `anchor` if given.
    pub async fn load(&self, entry: ManifestEntry, anchor: Option<String>) -> LoadOutcome {
        let ticket = self.generations.begin();
        let url = entry.fetch_url(&self.config.raw_root);
        tracing::info!(url = %url, generation = ticket.generation(), "Loading manual");
        self.surface.borrow_mut().show_loading();

        let result = fetch_text(&self.fetcher, &url).await;

        if !self.generations.is_current(ticket) {
            tracing::debug!(
                url = %url,
                generation = ticket.generation(),
                "Discarding superseded load"
            );
            return LoadOutcome::Superseded;
        }

        match result {
            Ok(text) => {
                let document = render_document(entry, url, &text, &self.config);
                self.install(document, anchor.as_deref(), ticket.generation());
                LoadOutcome::Loaded
            }
            Err(err) => {
                tracing::warn!(url = %url, error = %err, "Failed to load manual");
                self.surface
                    .borrow_mut()
                    .show_error(&format!("Failed to load manual: {err}"));
                LoadOutcome::Failed(err)
            }
        }
    }

    fn install(&self, mut document: RenderedDocument, anchor: Option<&str>, generation: u64) {
        let previous = self.current.borrow_mut().take();
        if let Some(previous) = previous {
            previous.spy.teardown();
        }

        let toc = TableOfContents::build(&mut document);
        let search = SearchIndex::build(&document);
        let viewport = Viewport::new(0.0, self.viewport.get().height);
        self.viewport.set(viewport);

        let mut surface = self.surface.borrow_mut();
        surface.show_document(&document);
        surface.show_toc(&toc);

        let spy = ScrollSpy::subscribe(surface.heading_offsets(&document), viewport);
        let active = spy.active();
        surface.mark_active(active.as_deref());
        *self.marked.borrow_mut() = active;

        surface.set_fragment(&encode_fragment(document.entry.identity()));

        if let Some(anchor) = anchor {
            match document.find_anchor(anchor) {
                Some(element) => surface.scroll_to(element),
                None => tracing::debug!(anchor, "Anchor not found in document"),
            }
        }
        drop(surface);

        tracing::debug!(
            manual = document.entry.identity(),
            headings = toc.entries().len(),
            searchable = search.len(),
            "Installed document"
        );
        *self.current.borrow_mut() = Some(Current {
            document,
            toc,
            search,
            spy,
            generation,
        });
    }

    /// Follow the current document's link at `index`.
    ///
    /// Returns `None` if there is no such link or it does not lead to a
    /// document.
    pub async fn follow_link(&self, index: usize) -> Option<LoadOutcome> {
        let target = {
            let current = self.current.borrow();
            current.as_ref()?.document.links().get(index)?.target.clone()?
        };
        self.surface.borrow_mut().scroll_to_top();
        Some(self.load(target.entry, target.anchor).await)
    }

    /// Load the manifest entry at `index`, closing the drawer first.
    pub async fn select(&self, index: usize) -> Option<LoadOutcome> {
        let entry = self.manifest.borrow().get(index).cloned()?;
        self.close_drawer();
        Some(self.load(entry, None).await)
    }

    /// Load the first manifest entry and scroll to the top.
    pub async fn home(&self) -> Option<LoadOutcome> {
        let entry = self.manifest.borrow().first().cloned()?;
        self.surface.borrow_mut().scroll_to_top();
        Some(self.load(entry, None).await)
    }

    /// Search the current document.
    ///
    /// Previous highlights are always cleared. Matches are highlighted and
    /// the first one scrolled into view.
    pub fn search(&self, query: &str) -> SearchOutcome {
        let outcome = match self.current.borrow().as_ref() {
            Some(current) => current.search.search(query),
            None if query.trim().is_empty() => SearchOutcome::Cleared,
            None => SearchOutcome::NoMatch,
        };

        let mut surface = self.surface.borrow_mut();
        surface.set_highlights(&[]);
        if let SearchOutcome::Matches { highlighted, first } = &outcome {
            surface.set_highlights(highlighted);
            surface.scroll_to(*first);
        }
        outcome
    }

    /// Report a new viewport and mark the heading now in view.
    ///
    /// Returns the active heading, or `None` when there is no current
    /// document or it was replaced while the report was processed.
    pub async fn update_viewport(&self, viewport: Viewport) -> Option<String> {
        self.viewport.set(viewport);

        let (generation, seq, mut state) = {
            let current = self.current.borrow();
            let current = current.as_ref()?;
            (
                current.generation,
                current.spy.report(viewport),
                current.spy.state_receiver(),
            )
        };

        let active = state.wait_for(|s| s.seq >= seq).await.ok()?.active.clone();

        let still_current = self
            .current
            .borrow()
            .as_ref()
            .is_some_and(|current| current.generation == generation);
        if !still_current {
            return None;
        }

        if *self.marked.borrow() != active {
            self.surface.borrow_mut().mark_active(active.as_deref());
            self.marked.replace(active.clone());
        }
        active
    }

    /// Heading currently in view.
    pub fn active_section(&self) -> Option<String> {
        self.current.borrow().as_ref()?.spy.active()
    }

    /// Flip the theme, apply it and persist it.
    ///
    /// A failed save is logged; the theme still changes.
    pub fn toggle_theme(&self) -> Theme {
        let theme = self.theme.get().toggled();
        self.theme.set(theme);
        self.surface.borrow_mut().apply_theme(theme);
        if let Err(err) = self.themes.save(theme.as_str()) {
            tracing::warn!(error = %err, "Failed to save theme");
        }
        theme
    }

    fn saved_theme(&self) -> Theme {
        match self.themes.load() {
            Ok(value) => Theme::from_stored(value.as_deref()),
            Err(err) => {
                tracing::warn!(error = %err, "Failed to read saved theme");
                Theme::default()
            }
        }
    }

    pub fn open_drawer(&self) {
        self.set_drawer(true);
    }

    pub fn close_drawer(&self) {
        self.set_drawer(false);
    }

    pub fn toggle_drawer(&self) -> bool {
        let open = !self.drawer_open.get();
        self.set_drawer(open);
        open
    }

    /// Escape key: close the drawer if it is open.
    pub fn escape(&self) {
        if self.drawer_open.get() {
            self.close_drawer();
        }
    }

    fn set_drawer(&self, open: bool) {
        self.drawer_open.set(open);
        self.surface.borrow_mut().set_drawer_open(open);
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn theme(&self) -> Theme {
        self.theme.get()
    }

    pub fn drawer_open(&self) -> bool {
        self.drawer_open.get()
    }

    pub fn manifest(&self) -> Ref<'_, Manifest> {
        self.manifest.borrow()
    }

    pub fn current_document(&self) -> Option<Ref<'_, RenderedDocument>> {
        Ref::filter_map(self.current.borrow(), |current| {
            current.as_ref().map(|c| &c.document)
        })
        .ok()
    }

    pub fn toc(&self) -> Option<Ref<'_, TableOfContents>> {
        Ref::filter_map(self.current.borrow(), |current| {
            current.as_ref().map(|c| &c.toc)
        })
        .ok()
    }

    /// Links of the current document.
    pub fn links(&self) -> Vec<DocumentLink> {
        self.current
            .borrow()
            .as_ref()
            .map(|current| current.document.links().to_vec())
            .unwrap_or_default()
    }

    pub fn surface(&self) -> Ref<'_, S> {
        self.surface.borrow()
    }

    pub fn surface_mut(&self) -> RefMut<'_, S> {
        self.surface.borrow_mut()
    }
}
