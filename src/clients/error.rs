//! Error types for the transport layer.

use thiserror::Error;

/// Network or non-success failures talking to any upstream service.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransportError {
    /// The request never produced a response (connect, timeout, TLS).
    #[error("Request failed: {0}")]
    Request(String),

    /// The upstream answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The response body did not match the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for TransportError {
    fn from(e: serde_json::Error) -> Self {
        TransportError::Decode(e.to_string())
    }
}
