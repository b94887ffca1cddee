//! # Framework Errors
//!
//! Failures of the resolver plumbing itself, as opposed to the upstream
//! services a fetcher talks to.

/// Errors that can occur talking to a resolver actor.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FrameworkError {
    #[error("Resolver closed")]
    ActorClosed,
    #[error("Resolver dropped response channel")]
    ActorDropped,
}
