//! # Query Resolver
//!
//! The debounced, staleness-safe resolution engine behind every free-text
//! field. One resolver per field; each runs as its own Tokio task and owns
//! all of its mutable state (debounce timer, sequence counter, applied
//! result), so no locks are needed and access is serialized even on a
//! multi-threaded runtime.
//!
//! ## Cycle
//!
//! ```text
//! Idle --submit--> Scheduled --timer--> InFlight --completion--> Idle
//!                  ^  |submit (reset)      |submit
//!                  +--+                    v
//!                                   InFlightScheduled
//! ```
//!
//! - A submit shorter than `min_length` clears the suggestions, cancels the
//!   timer and supersedes anything in flight.
//! - The sequence is incremented when the timer fires, not on submit.
//! - A completion is applied only if its sequence is still the latest one;
//!   older completions are dropped on arrival. In-flight calls are never
//!   aborted.
//! - A failed fetch applies as an empty list.

use crate::framework::client::ResolverClient;
use crate::framework::fetcher::Fetcher;
use crate::framework::message::{ResolverPhase, ResolverRequest, ResolverState};
use crate::framework::sequence::{ApplyOutcome, SequenceCounter};
use crate::clients::TransportError;
use crate::model::{SearchResult, Suggestion};
use crate::text::normalize_label;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// Per-field thresholds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Identifies the logical field in logs and results.
    pub source_id: String,
    pub debounce: Duration,
    /// Minimum trimmed length, in characters, worth a search.
    pub min_length: usize,
}

impl ResolverConfig {
    pub fn new(source_id: impl Into<String>, debounce: Duration, min_length: usize) -> Self {
        Self {
            source_id: source_id.into(),
            debounce,
            min_length,
        }
    }
}

struct Completion {
    sequence: u64,
    result: Result<Vec<Suggestion>, TransportError>,
}

/// The resolver actor for one field.
///
/// # Usage Pattern
///
/// 1. **Create**: `QueryResolver::new(config, fetcher)` returns the actor and
///    its client.
/// 2. **Run**: spawn `actor.run()` in a background task.
/// 3. **Use**: feed keystrokes with `client.submit(text)`; observe
///    `client.subscribe()`.
///
/// ```rust
/// use async_trait::async_trait;
/// use dispatch_console::clients::TransportError;
/// use dispatch_console::framework::{Fetcher, QueryResolver, ResolverConfig};
/// use dispatch_console::model::{Suggestion, SuggestionKind};
/// use std::time::Duration;
///
/// struct Echo;
///
/// #[async_trait]
/// impl Fetcher for Echo {
///     async fn fetch(&self, text: &str) -> Result<Vec<Suggestion>, TransportError> {
///         Ok(vec![Suggestion::plain(text.to_uppercase(), SuggestionKind::Customer)])
///     }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let config = ResolverConfig::new("customer", Duration::from_millis(10), 2);
///     let (actor, client) = QueryResolver::new(config, Echo);
///     tokio::spawn(actor.run());
///
///     client.submit("ana").await.unwrap();
///     let mut updates = client.subscribe();
///     while updates.borrow_and_update().result.sequence == 0 {
///         updates.changed().await.unwrap();
///     }
///     assert_eq!(client.current().labels(), vec!["ANA"]);
/// }
/// ```
pub struct QueryResolver<F: Fetcher> {
    config: ResolverConfig,
    fetcher: Arc<F>,
    receiver: mpsc::Receiver<ResolverRequest>,
    state: watch::Sender<ResolverState>,
    sequence: SequenceCounter,
    pending: Option<String>,
    in_flight: usize,
    query: String,
    result: SearchResult,
    fetches_issued: u64,
}

impl<F: Fetcher> QueryResolver<F> {
    /// Creates a resolver and its client.
    pub fn new(config: ResolverConfig, fetcher: F) -> (Self, ResolverClient) {
        Self::with_buffer(config, fetcher, 32)
    }

    /// Same as [`QueryResolver::new`] with an explicit request buffer.
    pub fn with_buffer(config: ResolverConfig, fetcher: F, buffer_size: usize) -> (Self, ResolverClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let initial = ResolverState {
            source_id: config.source_id.clone(),
            result: SearchResult {
                source_id: config.source_id.clone(),
                ..SearchResult::default()
            },
            ..ResolverState::default()
        };
        let (state, observer) = watch::channel(initial);
        let result = SearchResult {
            source_id: config.source_id.clone(),
            ..SearchResult::default()
        };
        let actor = Self {
            config,
            fetcher: Arc::new(fetcher),
            receiver,
            state,
            sequence: SequenceCounter::new(),
            pending: None,
            in_flight: 0,
            query: String::new(),
            result,
            fetches_issued: 0,
        };
        (actor, ResolverClient::new(sender, observer))
    }

    /// Runs the resolver until every client has been dropped.
    pub async fn run(mut self) {
        let source_id = self.config.source_id.clone();
        info!(%source_id, "Resolver started");

        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion>();
        let timer = sleep(self.config.debounce);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                biased;

                msg = self.receiver.recv() => match msg {
                    Some(request) => {
                        if let Some(deadline) = self.handle(request) {
                            timer.as_mut().reset(deadline);
                        }
                    }
                    None => break,
                },
                Some(done) = done_rx.recv() => self.complete(done),
                () = &mut timer, if self.pending.is_some() => self.fire(&done_tx),
            }
        }

        info!(%source_id, fetches = self.fetches_issued, "Resolver shutdown");
    }

    /// Returns the new debounce deadline when the request (re)schedules.
    fn handle(&mut self, request: ResolverRequest) -> Option<Instant> {
        match request {
            ResolverRequest::Submit { text } => self.submit(text),
            ResolverRequest::Clear => {
                debug!(source_id = %self.config.source_id, "Cleared");
                self.reset();
                self.publish();
                None
            }
            ResolverRequest::Select { index, respond_to } => {
                let chosen = self.result.items.get(index).cloned();
                debug!(source_id = %self.config.source_id, index, found = chosen.is_some(), "Select");
                self.reset();
                self.publish();
                let _ = respond_to.send(chosen);
                None
            }
            ResolverRequest::Snapshot { respond_to } => {
                let _ = respond_to.send(self.snapshot());
                None
            }
        }
    }

    fn submit(&mut self, text: String) -> Option<Instant> {
        let long_enough = text.trim().chars().count() >= self.config.min_length;
        self.query = text;

        if !long_enough {
            self.reset();
            self.publish();
            return None;
        }

        let deadline = Instant::now() + self.config.debounce;
        self.pending = Some(self.query.clone());
        self.publish();
        Some(deadline)
    }

    /// Drops suggestions, the pending timer and every outstanding tag.
    fn reset(&mut self) {
        self.pending = None;
        self.sequence.supersede();
        self.result.items.clear();
    }

    fn fire(&mut self, done_tx: &mpsc::UnboundedSender<Completion>) {
        let Some(text) = self.pending.take() else {
            return;
        };
        let sequence = self.sequence.issue();
        self.in_flight += 1;
        self.fetches_issued += 1;
        debug!(source_id = %self.config.source_id, sequence, %text, "Fetch issued");

        let fetcher = Arc::clone(&self.fetcher);
        let done = done_tx.clone();
        tokio::spawn(async move {
            let result = fetcher.fetch(&text).await;
            // The resolver may be gone; nothing left to apply to.
            let _ = done.send(Completion { sequence, result });
        });

        self.publish();
    }

    fn complete(&mut self, done: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let source_id = &self.config.source_id;

        match self.sequence.check(done.sequence) {
            ApplyOutcome::Stale => {
                debug!(%source_id, sequence = done.sequence, latest = self.sequence.latest(), "Stale result discarded");
            }
            ApplyOutcome::Applied => {
                let items = match done.result {
                    Ok(items) => dedupe(items),
                    Err(e) => {
                        warn!(%source_id, sequence = done.sequence, error = %e, "Fetch failed");
                        Vec::new()
                    }
                };
                debug!(%source_id, sequence = done.sequence, count = items.len(), "Result applied");
                self.result = SearchResult {
                    source_id: source_id.clone(),
                    sequence: done.sequence,
                    items,
                };
            }
        }

        self.publish();
    }

    fn snapshot(&self) -> ResolverState {
        ResolverState {
            source_id: self.config.source_id.clone(),
            phase: ResolverPhase::from_parts(self.pending.is_some(), self.in_flight > 0),
            query: self.query.clone(),
            result: self.result.clone(),
            fetches_issued: self.fetches_issued,
        }
    }

    fn publish(&self) {
        self.state.send_replace(self.snapshot());
    }
}

/// Keeps the first suggestion for each normalized label, in order.
fn dedupe(items: Vec<Suggestion>) -> Vec<Suggestion> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|s| seen.insert(normalize_label(&s.label)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::mock::MockFetcher;
    use crate::model::SuggestionKind;

    fn street(label: &str) -> Suggestion {
        Suggestion::plain(label, SuggestionKind::Street)
    }

    fn spawn(mock: &MockFetcher, min_length: usize) -> ResolverClient {
        let config = ResolverConfig::new("street", Duration::from_millis(300), min_length);
        let (actor, client) = QueryResolver::new(config, mock.fetcher());
        tokio::spawn(actor.run());
        client
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_issues_single_fetch_for_last_text() {
        let mock = MockFetcher::new();
        mock.expect_fetch("abc").return_ok(vec![street("Rua ABC")]);
        let client = spawn(&mock, 1);

        client.submit("a").await.unwrap();
        sleep(Duration::from_millis(40)).await;
        client.submit("ab").await.unwrap();
        sleep(Duration::from_millis(40)).await;
        client.submit("abc").await.unwrap();

        let state = client.snapshot().await.unwrap();
        assert_eq!(state.phase, ResolverPhase::Scheduled);

        sleep(Duration::from_secs(1)).await;

        assert_eq!(mock.calls(), vec!["abc".to_string()]);
        let state = client.snapshot().await.unwrap();
        assert_eq!(state.labels(), vec!["Rua ABC"]);
        assert_eq!(state.phase, ResolverPhase::Idle);
        assert_eq!(state.fetches_issued, 1);
        mock.verify();
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_earlier_fetch_never_overwrites_later_one() {
        let mock = MockFetcher::new();
        mock.expect_fetch("abc")
            .after(Duration::from_millis(500))
            .return_ok(vec![street("Old")]);
        mock.expect_fetch("abcd")
            .after(Duration::from_millis(50))
            .return_ok(vec![street("New")]);
        let client = spawn(&mock, 1);

        client.submit("abc").await.unwrap();
        sleep(Duration::from_millis(350)).await;
        client.submit("abcd").await.unwrap();
        assert_eq!(
            client.snapshot().await.unwrap().phase,
            ResolverPhase::InFlightScheduled
        );

        sleep(Duration::from_secs(2)).await;

        let state = client.snapshot().await.unwrap();
        assert_eq!(state.labels(), vec!["New"]);
        assert_eq!(state.result.sequence, 2);
        assert_eq!(state.phase, ResolverPhase::Idle);
        assert_eq!(mock.calls(), vec!["abc".to_string(), "abcd".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_input_clears_and_supersedes_in_flight() {
        let mock = MockFetcher::new();
        mock.expect_fetch("rua")
            .after(Duration::from_millis(200))
            .return_ok(vec![street("Rua Um")]);
        let client = spawn(&mock, 3);

        client.submit("rua").await.unwrap();
        sleep(Duration::from_millis(350)).await;
        client.submit("ru").await.unwrap();
        sleep(Duration::from_secs(1)).await;

        let state = client.snapshot().await.unwrap();
        assert!(state.suggestions().is_empty());
        assert_eq!(state.query, "ru");
        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_input_cancels_pending_timer() {
        let mock = MockFetcher::new();
        let client = spawn(&mock, 3);

        client.submit("rua").await.unwrap();
        sleep(Duration::from_millis(100)).await;
        client.submit("r").await.unwrap();
        sleep(Duration::from_secs(1)).await;

        assert!(mock.calls().is_empty());
        assert_eq!(client.snapshot().await.unwrap().phase, ResolverPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_failure_degrades_to_empty_list() {
        let mock = MockFetcher::new();
        mock.expect_fetch("rua")
            .return_ok(vec![street("Rua Um")]);
        mock.expect_fetch("rua x")
            .return_err(TransportError::Request("connection reset".into()));
        let client = spawn(&mock, 3);

        client.submit("rua").await.unwrap();
        sleep(Duration::from_secs(1)).await;
        assert_eq!(client.snapshot().await.unwrap().labels(), vec!["Rua Um"]);

        client.submit("rua x").await.unwrap();
        sleep(Duration::from_secs(1)).await;
        let state = client.snapshot().await.unwrap();
        assert!(state.suggestions().is_empty());
        assert_eq!(state.result.sequence, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_labels_are_collapsed() {
        let mock = MockFetcher::new();
        mock.expect_fetch("sumare").return_ok(vec![
            street("Jardim Sumaré"),
            street("jardim sumare"),
            street("Sumarezinho"),
        ]);
        let client = spawn(&mock, 3);

        client.submit("sumare").await.unwrap();
        sleep(Duration::from_secs(1)).await;

        assert_eq!(
            client.snapshot().await.unwrap().labels(),
            vec!["Jardim Sumaré", "Sumarezinho"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_returns_choice_and_clears() {
        let mock = MockFetcher::new();
        mock.expect_fetch("centro")
            .return_ok(vec![street("Centro"), street("Centro Norte")]);
        let client = spawn(&mock, 3);

        client.submit("centro").await.unwrap();
        sleep(Duration::from_secs(1)).await;

        let chosen = client.select(1).await.unwrap();
        assert_eq!(chosen.map(|s| s.label), Some("Centro Norte".to_string()));
        assert!(client.snapshot().await.unwrap().suggestions().is_empty());
        assert_eq!(client.select(5).await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blur_discards_late_result() {
        let mock = MockFetcher::new();
        mock.expect_fetch("centro")
            .after(Duration::from_millis(500))
            .return_ok(vec![street("Centro")]);
        let client = spawn(&mock, 3);

        client.submit("centro").await.unwrap();
        sleep(Duration::from_millis(400)).await;
        client.clear().await.unwrap();
        sleep(Duration::from_secs(1)).await;

        assert!(client.snapshot().await.unwrap().suggestions().is_empty());
    }

    #[tokio::test]
    async fn test_resolver_stops_when_clients_drop() {
        let mock = MockFetcher::new();
        let config = ResolverConfig::new("city", Duration::from_millis(10), 3);
        let (actor, client) = QueryResolver::new(config, mock.fetcher());
        let handle = tokio::spawn(actor.run());

        drop(client);
        handle.await.unwrap();
    }
}
