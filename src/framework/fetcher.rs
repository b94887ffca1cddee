//! # Fetcher Trait
//!
//! The one seam a [`QueryResolver`](crate::framework::QueryResolver) needs:
//! turn settled field text into suggestions. Implementations live next to
//! their upstream (address pipeline, customer/menu/tracking search) and are
//! injected at construction.

use crate::clients::TransportError;
use crate::model::Suggestion;
use async_trait::async_trait;

/// Resolves field text into suggestions.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use dispatch_console::clients::TransportError;
/// use dispatch_console::framework::Fetcher;
/// use dispatch_console::model::{Suggestion, SuggestionKind};
///
/// struct Echo;
///
/// #[async_trait]
/// impl Fetcher for Echo {
///     async fn fetch(&self, text: &str) -> Result<Vec<Suggestion>, TransportError> {
///         Ok(vec![Suggestion::plain(text, SuggestionKind::Customer)])
///     }
/// }
/// ```
#[async_trait]
pub trait Fetcher: Send + Sync + 'static {
    async fn fetch(&self, text: &str) -> Result<Vec<Suggestion>, TransportError>;
}
