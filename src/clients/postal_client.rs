//! # Postal Registry Client
//!
//! Structured lookup keyed by an 8-digit postal code (ViaCEP-style API).
//! A miss is a payload flag (`"erro": true`), not an HTTP error, so the client
//! reports it as `Ok(None)` and keeps [`TransportError`] for real failures.

use super::error::TransportError;
use super::http::{decode_json, HttpTransport};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};

/// The address fields a postal code resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PostalRecord {
    pub street: String,
    pub neighborhood: String,
    pub city: String,
    pub state: Option<String>,
}

/// Structured postal-code registry.
#[async_trait]
pub trait PostalRegistry: Send + Sync {
    /// Looks up a normalized 8-digit code; `Ok(None)` means "not found".
    async fn lookup(&self, code: &str) -> Result<Option<PostalRecord>, TransportError>;
}

#[derive(Debug, Deserialize)]
struct ViaCepPayload {
    #[serde(default)]
    erro: Option<serde_json::Value>,
    #[serde(default)]
    logradouro: Option<String>,
    #[serde(default)]
    bairro: Option<String>,
    #[serde(default)]
    localidade: Option<String>,
    #[serde(default)]
    uf: Option<String>,
}

impl ViaCepPayload {
    fn is_miss(&self) -> bool {
        match &self.erro {
            Some(serde_json::Value::Bool(flag)) => *flag,
            Some(serde_json::Value::String(flag)) => flag == "true",
            _ => false,
        }
    }

    fn into_record(self) -> Option<PostalRecord> {
        if self.is_miss() {
            return None;
        }
        Some(PostalRecord {
            street: self.logradouro.unwrap_or_default(),
            neighborhood: self.bairro.unwrap_or_default(),
            city: self.localidade.unwrap_or_default(),
            state: self.uf.filter(|uf| !uf.is_empty()),
        })
    }
}

/// HTTP client for a ViaCEP-compatible registry.
#[derive(Clone)]
pub struct ViaCepClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
}

impl ViaCepClient {
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PostalRegistry for ViaCepClient {
    #[instrument(skip(self))]
    async fn lookup(&self, code: &str) -> Result<Option<PostalRecord>, TransportError> {
        let url = format!("{}/{}/json/", self.base_url, code);
        let body = self.transport.get(&url, &[]).await?;
        let payload: ViaCepPayload = decode_json(&body)?;
        let record = payload.into_record();
        debug!(found = record.is_some(), "Postal lookup");
        Ok(record)
    }
}
