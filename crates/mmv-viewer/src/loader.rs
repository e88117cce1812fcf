//! Document fetching and load generations.

use std::cell::Cell;

use crate::error::DocumentLoadError;
use crate::fetch::Fetcher;

/// Proof that a load was started, and of which generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadTicket(u64);

impl LoadTicket {
    pub fn generation(self) -> u64 {
        self.0
    }
}

/// Generation counter for document loads.
///
/// Every load takes a ticket when it starts; only the holder of the newest
/// ticket may install its result.
#[derive(Debug, Default)]
pub struct LoadGenerations {
    current: Cell<u64>,
}

impl LoadGenerations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new load, superseding any load in flight.
    pub fn begin(&self) -> LoadTicket {
        let next = self.current.get() + 1;
        self.current.set(next);
        LoadTicket(next)
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        self.current.get() == ticket.0
    }

    pub fn current(&self) -> u64 {
        self.current.get()
    }
}

/// Fetch a document body as UTF-8 text.
pub async fn fetch_text<F: Fetcher>(fetcher: &F, url: &str) -> Result<String, DocumentLoadError> {
    let body = fetcher.fetch(url).await?;
    String::from_utf8(body).map_err(|_| DocumentLoadError::Decode {
        url: url.to_owned(),
    })
}
