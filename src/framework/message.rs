//! # Resolver Messages
//!
//! Requests a [`ResolverClient`](crate::framework::ResolverClient) sends to
//! its [`QueryResolver`](crate::framework::QueryResolver), and the state the
//! resolver publishes back.

use crate::model::{SearchResult, Suggestion};
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by resolvers.
pub type Response<T> = oneshot::Sender<T>;

/// Input events for one logical field.
///
/// `Submit` and `Clear` are fire-and-forget; `Select` and `Snapshot` answer
/// after every earlier request has been processed, which makes them usable
/// as barriers in tests.
#[derive(Debug)]
pub enum ResolverRequest {
    /// The field text changed.
    Submit { text: String },
    /// The field lost focus.
    Clear,
    /// The user picked the suggestion at `index`.
    Select {
        index: usize,
        respond_to: Response<Option<Suggestion>>,
    },
    Snapshot {
        respond_to: Response<ResolverState>,
    },
}

/// Where the resolver is in its debounce/fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolverPhase {
    #[default]
    Idle,
    /// A debounce timer is pending.
    Scheduled,
    /// At least one fetch is outstanding.
    InFlight,
    /// A fetch is outstanding and a newer timer is pending.
    InFlightScheduled,
}

impl ResolverPhase {
    pub(crate) fn from_parts(scheduled: bool, in_flight: bool) -> Self {
        match (scheduled, in_flight) {
            (false, false) => ResolverPhase::Idle,
            (true, false) => ResolverPhase::Scheduled,
            (false, true) => ResolverPhase::InFlight,
            (true, true) => ResolverPhase::InFlightScheduled,
        }
    }
}

/// Observable state of one field's resolver.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolverState {
    pub source_id: String,
    pub phase: ResolverPhase,
    /// Last text submitted, whether or not it was long enough to search.
    pub query: String,
    /// The last applied result; `sequence` 0 means nothing applied yet.
    pub result: SearchResult,
    pub fetches_issued: u64,
}

impl ResolverState {
    pub fn suggestions(&self) -> &[Suggestion] {
        &self.result.items
    }

    pub fn labels(&self) -> Vec<&str> {
        self.result.items.iter().map(|s| s.label.as_str()).collect()
    }
}
