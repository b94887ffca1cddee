//! # Mock Fetcher
//!
//! `MockFetcher` implements [`Fetcher`] entirely in memory. Tests script the
//! answer (and how long it takes) for each query text, hand a clone to a
//! [`QueryResolver`](crate::framework::QueryResolver), then inspect the calls
//! it actually received.
//!
//! Combine it with `#[tokio::test(start_paused = true)]`: scripted delays then
//! run on the paused clock, so debounce and out-of-order scenarios are exact
//! and instant.
//!
//! ```rust
//! use dispatch_console::framework::mock::MockFetcher;
//! use dispatch_console::framework::Fetcher;
//! use dispatch_console::model::{Suggestion, SuggestionKind};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mock = MockFetcher::new();
//!     mock.expect_fetch("centro")
//!         .return_ok(vec![Suggestion::plain("Centro", SuggestionKind::Neighborhood)]);
//!
//!     let items = mock.fetcher().fetch("centro").await.unwrap();
//!     assert_eq!(items[0].label, "Centro");
//!     mock.verify();
//! }
//! ```
//!
//! Unscripted texts answer with an empty list and are reported by
//! [`MockFetcher::verify`].

use crate::clients::TransportError;
use crate::framework::fetcher::Fetcher;
use crate::model::Suggestion;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct Scripted {
    delay: Duration,
    response: Result<Vec<Suggestion>, TransportError>,
}

#[derive(Default)]
struct Inner {
    scripted: HashMap<String, VecDeque<Scripted>>,
    calls: Vec<String>,
    unexpected: Vec<String>,
}

/// A scripted fetcher; clones share their script and call log.
#[derive(Clone, Default)]
pub struct MockFetcher {
    inner: Arc<Mutex<Inner>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle to pass to the code under test.
    pub fn fetcher(&self) -> MockFetcher {
        self.clone()
    }

    /// Scripts the next answer for `text`. Repeated calls queue up in order.
    pub fn expect_fetch(&self, text: impl Into<String>) -> FetchExpectationBuilder {
        FetchExpectationBuilder {
            text: text.into(),
            delay: Duration::ZERO,
            inner: Arc::clone(&self.inner),
        }
    }

    /// Texts fetched so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Panics if a scripted answer was never consumed or an unscripted text
    /// was fetched.
    pub fn verify(&self) {
        let inner = self.inner.lock().unwrap();
        let remaining: usize = inner.scripted.values().map(VecDeque::len).sum();
        if remaining > 0 {
            panic!("Not all expectations were met. {} remaining", remaining);
        }
        if !inner.unexpected.is_empty() {
            panic!("Unexpected fetches: {:?}", inner.unexpected);
        }
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, text: &str) -> Result<Vec<Suggestion>, TransportError> {
        let scripted = {
            let mut inner = self.inner.lock().unwrap();
            inner.calls.push(text.to_string());
            let next = inner.scripted.get_mut(text).and_then(VecDeque::pop_front);
            if next.is_none() {
                inner.unexpected.push(text.to_string());
            }
            next
        };

        match scripted {
            Some(Scripted { delay, response }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                response
            }
            None => Ok(Vec::new()),
        }
    }
}

/// Builder for one scripted answer.
pub struct FetchExpectationBuilder {
    text: String,
    delay: Duration,
    inner: Arc<Mutex<Inner>>,
}

impl FetchExpectationBuilder {
    /// Delays the answer by `delay` after the call starts.
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn return_ok(self, items: Vec<Suggestion>) {
        self.push(Ok(items));
    }

    pub fn return_err(self, error: TransportError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<Vec<Suggestion>, TransportError>) {
        let mut inner = self.inner.lock().unwrap();
        inner.scripted.entry(self.text).or_default().push_back(Scripted {
            delay: self.delay,
            response,
        });
    }
}
