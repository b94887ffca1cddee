//! # Scripted Tracking Source
//!
//! An in-memory [`TrackingSource`] that answers from a queue of scripted
//! responses, optionally delayed. Clones share the queue, so a test can keep
//! one handle and give another to a session.
//!
//! ```rust
//! use dispatch_console::model::OrderId;
//! use dispatch_console::tracking::mock::{detail_fixture, ScriptedTrackingSource};
//! use dispatch_console::tracking::TrackingSource;
//!
//! #[tokio::main]
//! async fn main() {
//!     let source = ScriptedTrackingSource::new();
//!     source.push_ok(detail_fixture(Some((-21.18, -47.81))));
//!
//!     let detail = source.tracking_detail(&OrderId::from("o-2")).await.unwrap();
//!     assert_eq!(detail.stops().len(), 2);
//!     assert_eq!(source.calls(), 1);
//! }
//! ```

use super::session::TrackingSource;
use crate::clients::TransportError;
use crate::geometry::{encode, Coordinate};
use crate::model::{
    BatchRoute, OrderId, OrderStatus, RouteInfo, Stop, TrackedCourier, TrackedOrder,
    TrackingDetail,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Scripted = (Duration, Result<TrackingDetail, TransportError>);

#[derive(Clone, Default)]
pub struct ScriptedTrackingSource {
    queue: Arc<Mutex<VecDeque<Scripted>>>,
    calls: Arc<Mutex<usize>>,
}

impl ScriptedTrackingSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, detail: TrackingDetail) {
        self.push(Duration::ZERO, Ok(detail));
    }

    pub fn push_ok_after(&self, delay: Duration, detail: TrackingDetail) {
        self.push(delay, Ok(detail));
    }

    pub fn push_err(&self, error: TransportError) {
        self.push(Duration::ZERO, Err(error));
    }

    pub fn push(&self, delay: Duration, response: Result<TrackingDetail, TransportError>) {
        self.queue.lock().unwrap().push_back((delay, response));
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    pub fn remaining(&self) -> usize {
        self.queue.lock().unwrap().len()
    }
}

#[async_trait]
impl TrackingSource for ScriptedTrackingSource {
    async fn tracking_detail(&self, _order_id: &OrderId) -> Result<TrackingDetail, TransportError> {
        *self.calls.lock().unwrap() += 1;
        let next = self.queue.lock().unwrap().pop_front();
        match next {
            Some((delay, response)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                response
            }
            None => Err(TransportError::Request("no scripted response".into())),
        }
    }
}

/// Order `o-2`, second of two stops in batch `b-1`, with a two-leg route.
/// `courier` is the courier's fix; `None` means the courier has not
/// reported one.
pub fn detail_fixture(courier: Option<(f64, f64)>) -> TrackingDetail {
    let stop = |id: &str, name: &str, lat: f64, lng: f64, status| Stop {
        id: OrderId::from(id),
        customer_name: name.to_string(),
        address_text: format!("Rua {name}, 100"),
        lat,
        lng,
        status,
    };
    let route = [
        Coordinate::new(-21.17, -47.80),
        Coordinate::new(-21.16, -47.79),
        Coordinate::new(-21.15, -47.81),
    ];

    TrackingDetail {
        order: TrackedOrder {
            id: OrderId::from("o-2"),
            short_id: Some("B2".into()),
            customer_name: "Bruno".into(),
            address_text: "Rua Bruno, 100".into(),
            status: OrderStatus::PickedUp,
            tracking_code: Some("TRK-0002".into()),
            lat: Some(-21.15),
            lng: Some(-47.81),
        },
        batch: Some(BatchRoute {
            id: "b-1".into(),
            stops: vec![
                stop("o-1", "Ana", -21.16, -47.79, OrderStatus::Delivered),
                stop("o-2", "Bruno", -21.15, -47.81, OrderStatus::PickedUp),
            ],
        }),
        courier: Some(TrackedCourier {
            id: "c-1".into(),
            name: "Rui".into(),
            current_lat: courier.map(|(lat, _)| lat),
            current_lng: courier.map(|(_, lng)| lng),
        }),
        route: Some(RouteInfo {
            polyline: Some(encode(&route)),
        }),
    }
}
