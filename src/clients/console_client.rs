//! # Console API Client
//!
//! Typed access to the dispatch console backend: tracking detail, the
//! aggregate dashboard collections, the customer and menu searches and the
//! opaque dispatch trigger.

use super::error::TransportError;
use super::http::{decode_json, HttpTransport};
use crate::model::{
    BatchSummary, CourierSummary, Customer, DispatchStats, DispatchSummary, MenuItem, OrderId,
    OrderSummary, TrackingDetail,
};
use crate::polling::{DashboardPayload, DashboardResource, DashboardSource};
use crate::tracking::TrackingSource;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Client for the console backend.
#[derive(Clone)]
pub struct ConsoleApi {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    orders_limit: usize,
}

impl ConsoleApi {
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            orders_limit: 50,
        }
    }

    /// How many orders a dashboard poll asks for.
    pub fn with_orders_limit(mut self, limit: usize) -> Self {
        self.orders_limit = limit;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, TransportError> {
        let body = self.transport.get(&self.url(path), query).await?;
        decode_json(&body)
    }

    #[instrument(skip(self))]
    pub async fn orders(&self, limit: usize) -> Result<Vec<OrderSummary>, TransportError> {
        self.get_json("/orders", &[("limit", limit.to_string())]).await
    }

    #[instrument(skip(self))]
    pub async fn couriers(&self) -> Result<Vec<CourierSummary>, TransportError> {
        self.get_json("/couriers", &[]).await
    }

    #[instrument(skip(self))]
    pub async fn active_batches(&self) -> Result<Vec<BatchSummary>, TransportError> {
        self.get_json("/dispatch/batches", &[]).await
    }

    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<DispatchStats, TransportError> {
        self.get_json("/dispatch/stats", &[]).await
    }

    #[instrument(skip(self))]
    pub async fn search_customers(&self, text: &str) -> Result<Vec<Customer>, TransportError> {
        self.get_json("/customers", &[("search", text.to_string())])
            .await
    }

    /// Exact lookup by phone digits; a 404 means "no such customer".
    #[instrument(skip(self))]
    pub async fn customer_by_phone(&self, digits: &str) -> Result<Option<Customer>, TransportError> {
        match self
            .get_json::<Customer>(&format!("/customers/phone/{digits}"), &[])
            .await
        {
            Ok(customer) => Ok(Some(customer)),
            Err(TransportError::Status { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self))]
    pub async fn menu_items(&self) -> Result<Vec<MenuItem>, TransportError> {
        self.get_json("/menu/items", &[]).await
    }

    /// Runs the server-side batch assignment and returns its summary.
    #[instrument(skip(self))]
    pub async fn run_dispatch(&self) -> Result<DispatchSummary, TransportError> {
        let body = self.transport.post(&self.url("/dispatch/run")).await?;
        let summary: DispatchSummary = decode_json(&body)?;
        info!(
            batches_created = summary.batches_created,
            orders_assigned = summary.orders_assigned,
            "Dispatch finished"
        );
        Ok(summary)
    }
}

#[async_trait]
impl TrackingSource for ConsoleApi {
    #[instrument(skip(self))]
    async fn tracking_detail(&self, order_id: &OrderId) -> Result<TrackingDetail, TransportError> {
        debug!("Fetching tracking detail");
        self.get_json(&format!("/orders/{order_id}/tracking-details"), &[])
            .await
    }
}

#[async_trait]
impl DashboardSource for ConsoleApi {
    async fn fetch(&self, resource: DashboardResource) -> Result<DashboardPayload, TransportError> {
        Ok(match resource {
            DashboardResource::Orders => DashboardPayload::Orders(self.orders(self.orders_limit).await?),
            DashboardResource::Couriers => DashboardPayload::Couriers(self.couriers().await?),
            DashboardResource::Batches => DashboardPayload::Batches(self.active_batches().await?),
            DashboardResource::Stats => DashboardPayload::Stats(self.stats().await?),
        })
    }
}
