//! Scroll-spy: tracking which section is in view.
//!
//! A [`ScrollSpy`] is a subscription scoped to one document. Viewport reports
//! go in on one watch channel; a background task turns each report into the
//! active heading and publishes it on another. Tearing the spy down aborts
//! the task and closes both channels.

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Fraction of the viewport height, from the top, that counts as "at the top".
const ACTIVE_RATIO: f64 = 0.3;

/// Visible window over the rendered document.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    /// Offset of the first visible line.
    pub top: f64,
    /// Visible height.
    pub height: f64,
}

impl Viewport {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    fn threshold(self) -> f64 {
        self.top + self.height * ACTIVE_RATIO
    }
}

/// Heading nearest the top of the viewport.
///
/// `offsets` pairs heading ids with their vertical offsets, in document
/// order. The active heading is the last one at or above the threshold line.
pub fn active_heading(offsets: &[(String, f64)], viewport: Viewport) -> Option<&str> {
    let threshold = viewport.threshold();
    offsets
        .iter()
        .take_while(|(_, offset)| *offset <= threshold)
        .last()
        .map(|(id, _)| id.as_str())
}

/// Latest output of the spy.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpyState {
    /// Sequence number of the viewport report this state answers.
    pub seq: u64,
    /// Active heading id.
    pub active: Option<String>,
}

/// Live visibility subscription for one document.
#[derive(Debug)]
pub struct ScrollSpy {
    viewport: watch::Sender<(u64, Viewport)>,
    state: watch::Receiver<SpyState>,
    task: JoinHandle<()>,
}

impl ScrollSpy {
    /// Start tracking `offsets`. The initial state is computed immediately.
    pub fn subscribe(offsets: Vec<(String, f64)>, initial: Viewport) -> Self {
        let active = active_heading(&offsets, initial).map(str::to_owned);
        let (viewport_tx, viewport_rx) = watch::channel((0, initial));
        let (state_tx, state_rx) = watch::channel(SpyState { seq: 0, active });

        tracing::debug!(headings = offsets.len(), "Scroll-spy subscribed");
        let task = tokio::spawn(track(offsets, viewport_rx, state_tx));

        Self {
            viewport: viewport_tx,
            state: state_rx,
            task,
        }
    }

    /// Report a new viewport. Returns the report's sequence number.
    pub fn report(&self, viewport: Viewport) -> u64 {
        let mut seq = 0;
        self.viewport.send_modify(|(current_seq, current)| {
            *current_seq += 1;
            *current = viewport;
            seq = *current_seq;
        });
        seq
    }

    /// Active heading as of the latest processed report.
    pub fn active(&self) -> Option<String> {
        self.state.borrow().active.clone()
    }

    /// Receiver for state updates.
    pub fn state_receiver(&self) -> watch::Receiver<SpyState> {
        self.state.clone()
    }

    /// End the subscription.
    pub fn teardown(self) {
        tracing::debug!("Scroll-spy torn down");
    }
}

impl Drop for ScrollSpy {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn track(
    offsets: Vec<(String, f64)>,
    mut viewport: watch::Receiver<(u64, Viewport)>,
    state: watch::Sender<SpyState>,
) {
    while viewport.changed().await.is_ok() {
        let (seq, current) = *viewport.borrow_and_update();
        let active = active_heading(&offsets, current).map(str::to_owned);
        state.send_replace(SpyState { seq, active });
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn offsets() -> Vec<(String, f64)> {
        vec![
            ("intro".to_owned(), 0.0),
            ("install".to_owned(), 100.0),
            ("usage".to_owned(), 200.0),
        ]
    }

    #[test]
    fn test_active_heading() {
        let offsets = offsets();
        assert_eq!(active_heading(&offsets, Viewport::new(0.0, 100.0)), Some("intro"));
        assert_eq!(active_heading(&offsets, Viewport::new(80.0, 100.0)), Some("install"));
        assert_eq!(active_heading(&offsets, Viewport::new(60.0, 100.0)), Some("intro"));
        assert_eq!(active_heading(&offsets, Viewport::new(500.0, 100.0)), Some("usage"));
    }

    #[test]
    fn test_active_heading_above_first() {
        let offsets = vec![("late".to_owned(), 50.0)];
        assert_eq!(active_heading(&offsets, Viewport::new(0.0, 100.0)), None);
        assert_eq!(active_heading(&[], Viewport::new(0.0, 100.0)), None);
    }

    #[tokio::test]
    async fn test_reports_update_active() {
        let spy = ScrollSpy::subscribe(offsets(), Viewport::new(0.0, 100.0));
        assert_eq!(spy.active().as_deref(), Some("intro"));

        let seq = spy.report(Viewport::new(180.0, 100.0));
        let mut state = spy.state_receiver();
        let latest = state.wait_for(|s| s.seq >= seq).await.unwrap().clone();

        assert_eq!(latest, SpyState {
            seq: 1,
            active: Some("usage".to_owned()),
        });
        assert_eq!(spy.active().as_deref(), Some("usage"));
    }

    #[tokio::test]
    async fn test_teardown_closes_subscription() {
        let spy = ScrollSpy::subscribe(offsets(), Viewport::new(0.0, 100.0));
        let mut state = spy.state_receiver();
        spy.teardown();
        assert!(state.changed().await.is_err());
    }
}
