//! # Fuzzy Place Search Client
//!
//! Free-text geocoder (Photon-style API). Every attribute of a returned
//! feature is optional; callers pick the one they need and skip features that
//! lack it.

use super::error::TransportError;
use super::http::{decode_json, HttpTransport};
use crate::geometry::Coordinate;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Properties of one search hit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlaceFeature {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub suburb: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default)]
    pub neighbourhood: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

/// Fuzzy place-search provider.
#[async_trait]
pub trait PlaceSearch: Send + Sync {
    async fn search(
        &self,
        query: &str,
        limit: usize,
        bias: Coordinate,
    ) -> Result<Vec<PlaceFeature>, TransportError>;
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: PlaceFeature,
}

/// HTTP client for a Photon-compatible search endpoint.
#[derive(Clone)]
pub struct PhotonClient {
    transport: Arc<dyn HttpTransport>,
    url: String,
}

impl PhotonClient {
    pub fn new(transport: Arc<dyn HttpTransport>, url: impl Into<String>) -> Self {
        Self {
            transport,
            url: url.into(),
        }
    }
}

#[async_trait]
impl PlaceSearch for PhotonClient {
    #[instrument(skip(self))]
    async fn search(
        &self,
        query: &str,
        limit: usize,
        bias: Coordinate,
    ) -> Result<Vec<PlaceFeature>, TransportError> {
        let params = [
            ("q", query.to_string()),
            ("limit", limit.to_string()),
            ("lat", bias.lat.to_string()),
            ("lon", bias.lng.to_string()),
        ];
        let body = self.transport.get(&self.url, &params).await?;
        let collection: FeatureCollection = decode_json(&body)?;
        debug!(hits = collection.features.len(), "Place search");
        Ok(collection.features.into_iter().map(|f| f.properties).collect())
    }
}
