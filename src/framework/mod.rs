//! Resolution engine shared by every free-text field.
//!
//! # Main Components
//!
//! - [`Fetcher`] - The upstream seam a resolver queries
//! - [`QueryResolver`] - Debounced, latest-only resolver actor
//! - [`ResolverClient`] - Cloneable handle to a running resolver
//! - [`SequenceCounter`] / [`GenerationGate`] - Ordering guards for completions
//! - [`FrameworkError`] - Channel failures
//!
//! # Testing
//!
//! See the [`mock`] module for a scripted [`Fetcher`].

pub mod client;
pub mod error;
pub mod fetcher;
pub mod message;
pub mod mock;
pub mod resolver;
pub mod sequence;

pub use client::ResolverClient;
pub use error::FrameworkError;
pub use fetcher::Fetcher;
pub use message::{ResolverPhase, ResolverRequest, ResolverState};
pub use resolver::{QueryResolver, ResolverConfig};
pub use sequence::{ApplyOutcome, GenerationGate, SequenceCounter};
