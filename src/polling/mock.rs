//! # Scripted Dashboard Source
//!
//! An in-memory [`DashboardSource`] with one response queue per resource.
//! Resources with nothing queued answer with an empty payload, so a test only
//! scripts the resource it is about.

use super::dashboard::{DashboardPayload, DashboardResource, DashboardSource};
use crate::clients::TransportError;
use crate::model::{OrderId, OrderStatus, OrderSummary};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Scripted = (Duration, Result<DashboardPayload, TransportError>);

#[derive(Default)]
struct Script {
    queues: HashMap<DashboardResource, VecDeque<Scripted>>,
    calls: HashMap<DashboardResource, usize>,
}

#[derive(Clone, Default)]
pub struct ScriptedDashboard {
    script: Arc<Mutex<Script>>,
}

impl ScriptedDashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, payload: DashboardPayload) {
        self.push_after(Duration::ZERO, Ok(payload));
    }

    /// Queues a delayed answer. An error goes to the orders queue; use
    /// [`push_err`](Self::push_err) to target another resource.
    pub fn push_after(&self, delay: Duration, response: Result<DashboardPayload, TransportError>) {
        let resource = match &response {
            Ok(payload) => payload.resource(),
            Err(_) => DashboardResource::Orders,
        };
        self.enqueue(resource, delay, response);
    }

    pub fn push_err(&self, resource: DashboardResource, error: TransportError) {
        self.enqueue(resource, Duration::ZERO, Err(error));
    }

    pub fn calls(&self, resource: DashboardResource) -> usize {
        self.script
            .lock()
            .unwrap()
            .calls
            .get(&resource)
            .copied()
            .unwrap_or(0)
    }

    fn enqueue(&self, resource: DashboardResource, delay: Duration, response: Result<DashboardPayload, TransportError>) {
        self.script
            .lock()
            .unwrap()
            .queues
            .entry(resource)
            .or_default()
            .push_back((delay, response));
    }
}

#[async_trait]
impl DashboardSource for ScriptedDashboard {
    async fn fetch(&self, resource: DashboardResource) -> Result<DashboardPayload, TransportError> {
        let next = {
            let mut script = self.script.lock().unwrap();
            *script.calls.entry(resource).or_default() += 1;
            script.queues.get_mut(&resource).and_then(VecDeque::pop_front)
        };
        match next {
            Some((delay, response)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                response
            }
            None => Ok(DashboardPayload::empty(resource)),
        }
    }
}

/// A minimal order summary.
pub fn order(id: &str, status: OrderStatus) -> OrderSummary {
    OrderSummary {
        id: OrderId::from(id),
        short_id: None,
        customer_name: format!("Cliente {id}"),
        address_text: String::new(),
        status,
        tracking_code: None,
        batch_id: None,
        created_at: None,
    }
}
