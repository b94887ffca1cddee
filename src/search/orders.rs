//! Tracking search: find an order by tracking code, short id or customer
//! name among the recent orders.

use crate::clients::{ConsoleApi, TransportError};
use crate::framework::Fetcher;
use crate::model::{OrderSummary, Suggestion, SuggestionKind};
use crate::text::matches_loosely;
use async_trait::async_trait;

pub const TRACKING_SUGGESTIONS: usize = 5;

/// `"#A1B2 Ana Souza"`, or just the name when there is no short id.
pub fn order_label(order: &OrderSummary) -> String {
    match order.short_id.as_deref() {
        Some(short_id) => format!("#{} {}", short_id, order.customer_name),
        None => order.customer_name.clone(),
    }
}

fn order_matches(order: &OrderSummary, text: &str) -> bool {
    let text = text.trim().trim_start_matches('#');
    let code_matches = |value: &Option<String>| {
        value
            .as_deref()
            .is_some_and(|v| v.to_lowercase().contains(&text.to_lowercase()))
    };
    code_matches(&order.tracking_code)
        || code_matches(&order.short_id)
        || matches_loosely(&order.customer_name, text)
}

/// Searches the most recent orders.
#[derive(Clone)]
pub struct TrackingSearchFetcher {
    api: ConsoleApi,
    recent: usize,
}

impl TrackingSearchFetcher {
    pub fn new(api: ConsoleApi, recent: usize) -> Self {
        Self { api, recent }
    }
}

#[async_trait]
impl Fetcher for TrackingSearchFetcher {
    async fn fetch(&self, text: &str) -> Result<Vec<Suggestion>, TransportError> {
        let orders = self.api.orders(self.recent).await?;
        orders
            .into_iter()
            .filter(|order| order_matches(order, text))
            .take(TRACKING_SUGGESTIONS)
            .map(|order| -> Result<Suggestion, TransportError> {
                let raw = serde_json::to_value(&order)?;
                Ok(Suggestion::new(order_label(&order), SuggestionKind::Tracking, raw))
            })
            .collect()
    }
}
