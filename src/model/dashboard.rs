//! Aggregate collections shown on the dispatch dashboard.
//!
//! These are consumed wholesale on every poll tick, so they carry only what
//! the console displays.

use super::tracking::{OrderId, OrderStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: OrderId,
    #[serde(default)]
    pub short_id: Option<String>,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub address_text: String,
    pub status: OrderStatus,
    #[serde(default)]
    pub tracking_code: Option<String>,
    #[serde(default)]
    pub batch_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourierStatus {
    Available,
    Busy,
    Offline,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourierSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub status: CourierStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Assigned,
    InProgress,
    Done,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub id: String,
    pub courier_id: String,
    #[serde(default)]
    pub courier_name: Option<String>,
    pub status: BatchStatus,
    #[serde(default)]
    pub orders: Vec<OrderSummary>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DispatchStats {
    #[serde(default)]
    pub orders: BTreeMap<String, u32>,
    #[serde(default)]
    pub couriers: BTreeMap<String, u32>,
    #[serde(default)]
    pub active_batches: u32,
    #[serde(default)]
    pub pending_orders: u32,
    #[serde(default)]
    pub available_couriers: u32,
}

/// Result of the opaque dispatch action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchSummary {
    pub batches_created: u32,
    #[serde(default)]
    pub orders_assigned: u32,
    pub message: String,
}

/// Number of orders that still need attention.
pub fn count_active(orders: &[OrderSummary]) -> usize {
    orders.iter().filter(|o| o.status.is_active()).count()
}
