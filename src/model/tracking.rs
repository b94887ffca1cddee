//! Tracking detail payload for one order.
//!
//! Mirrors the `/orders/{id}/tracking-details` response: the order itself,
//! the batch it rides in (ordered stops), the assigned courier with an
//! optional last known fix, and an optional encoded route.

use crate::geometry::Coordinate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Type-safe identifier for Orders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl From<&str> for OrderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for OrderId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Created,
    Preparing,
    Ready,
    Assigned,
    PickedUp,
    Delivered,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    /// Still on its way to the customer.
    pub fn is_active(self) -> bool {
        !matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedOrder {
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
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

/// One delivery point in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: OrderId,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub address_text: String,
    pub lat: f64,
    pub lng: f64,
    pub status: OrderStatus,
}

impl Stop {
    pub fn position(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRoute {
    pub id: String,
    #[serde(default, rename = "orders")]
    pub stops: Vec<Stop>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedCourier {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub current_lat: Option<f64>,
    #[serde(default)]
    pub current_lng: Option<f64>,
}

impl TrackedCourier {
    /// The last known fix, if the courier reported both halves of it.
    pub fn position(&self) -> Option<Coordinate> {
        match (self.current_lat, self.current_lng) {
            (Some(lat), Some(lng)) => Some(Coordinate::new(lat, lng)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RouteInfo {
    #[serde(default)]
    pub polyline: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingDetail {
    pub order: TrackedOrder,
    #[serde(default)]
    pub batch: Option<BatchRoute>,
    #[serde(default)]
    pub courier: Option<TrackedCourier>,
    #[serde(default)]
    pub route: Option<RouteInfo>,
}

impl TrackingDetail {
    pub fn stops(&self) -> &[Stop] {
        self.batch.as_ref().map(|b| b.stops.as_slice()).unwrap_or(&[])
    }

    pub fn courier_position(&self) -> Option<Coordinate> {
        self.courier.as_ref().and_then(TrackedCourier::position)
    }

    pub fn encoded_route(&self) -> Option<&str> {
        self.route.as_ref().and_then(|r| r.polyline.as_deref())
    }

    /// Stop ids in batch order.
    pub fn stop_ids(&self) -> Vec<&OrderId> {
        self.stops().iter().map(|s| &s.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_backend_payload() {
        let json = r#"{
            "order": {"id": "o-1", "short_id": "A12", "customer_name": "Ana",
                      "address_text": "Rua X, 10", "status": "picked_up",
                      "tracking_code": "MF-ABC123"},
            "batch": {"id": "b-1", "orders": [
                {"id": "o-1", "customer_name": "Ana", "address_text": "Rua X, 10",
                 "lat": -21.17, "lng": -47.80, "status": "picked_up"}
            ]},
            "courier": {"id": "c-1", "name": "Joao", "current_lat": -21.18, "current_lng": -47.81},
            "route": {"polyline": "_p~iF~ps|U"}
        }"#;

        let detail: TrackingDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.order.status, OrderStatus::PickedUp);
        assert_eq!(detail.stops().len(), 1);
        assert_eq!(detail.courier_position(), Some(Coordinate::new(-21.18, -47.81)));
        assert_eq!(detail.encoded_route(), Some("_p~iF~ps|U"));
    }

    #[test]
    fn test_optional_sections_may_be_absent() {
        let json = r#"{"order": {"id": "o-2", "status": "something_new"}}"#;
        let detail: TrackingDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.order.status, OrderStatus::Unknown);
        assert!(detail.stops().is_empty());
        assert_eq!(detail.courier_position(), None);
        assert_eq!(detail.encoded_route(), None);
    }

    #[test]
    fn test_courier_without_full_fix_has_no_position() {
        let courier = TrackedCourier {
            id: "c".into(),
            name: "Rui".into(),
            current_lat: Some(-21.0),
            current_lng: None,
        };
        assert_eq!(courier.position(), None);
    }
}
