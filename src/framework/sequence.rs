//! # Issuance Ordering
//!
//! Two small counters that make out-of-order completions harmless.
//!
//! - [`SequenceCounter`] is the strict form used by resolvers: only the
//!   latest issued tag may be applied.
//! - [`GenerationGate`] is the polling form: a completion is applied when its
//!   generation is at least the last applied one, so a fresher answer always
//!   wins and an older one never overwrites it.
//!
//! Neither type locks; the owner serializes access (an actor task, or a mutex
//! held only around the `issue`/`try_apply` calls).

/// Result of offering a completion to a counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// Superseded by a later issuance; discard silently.
    Stale,
}

impl ApplyOutcome {
    pub fn is_applied(self) -> bool {
        matches!(self, ApplyOutcome::Applied)
    }
}

/// Monotonic per-field sequence with "latest only" semantics.
#[derive(Debug, Clone, Default)]
pub struct SequenceCounter {
    latest: u64,
}

impl SequenceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tags a new call; every earlier tag becomes stale.
    pub fn issue(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    /// Invalidates every outstanding tag without issuing a call.
    pub fn supersede(&mut self) {
        self.latest += 1;
    }

    pub fn latest(&self) -> u64 {
        self.latest
    }

    pub fn check(&self, tag: u64) -> ApplyOutcome {
        if tag == self.latest {
            ApplyOutcome::Applied
        } else {
            ApplyOutcome::Stale
        }
    }
}

/// Per-resource generation counter with "not older than applied" semantics.
#[derive(Debug, Clone, Default)]
pub struct GenerationGate {
    issued: u64,
    applied: u64,
}

impl GenerationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the generation for a tick about to fetch.
    pub fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Would a completion of this generation still be applied?
    pub fn is_fresh(&self, generation: u64) -> bool {
        generation >= self.applied
    }

    /// Records the generation as applied if it is fresh.
    pub fn try_apply(&mut self, generation: u64) -> ApplyOutcome {
        if self.is_fresh(generation) {
            self.applied = generation;
            ApplyOutcome::Applied
        } else {
            ApplyOutcome::Stale
        }
    }

    pub fn issued(&self) -> u64 {
        self.issued
    }

    pub fn last_applied(&self) -> u64 {
        self.applied
    }
}
