//! # Dashboard Store
//!
//! Latest applied state of the four aggregate dashboard resources, guarded by
//! one [`GenerationGate`] per resource.
//!
//! - A successful fetch replaces the resource's data and marks that resource
//!   healthy.
//! - A failed fetch keeps the data and marks that resource failing.
//! - The dashboard is connected only while no resource is failing.
//! - Either is ignored when a later tick of the same resource already
//!   applied.
//! - When the applied orders list holds more active orders than the previous
//!   one, a [`DashboardEvent::NewActiveOrders`] is broadcast. The first load
//!   never fires it.

use crate::clients::TransportError;
use crate::framework::{ApplyOutcome, GenerationGate};
use crate::model::{count_active, BatchSummary, CourierSummary, DispatchStats, OrderSummary};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::sync::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DashboardResource {
    Orders,
    Couriers,
    Batches,
    Stats,
}

impl DashboardResource {
    pub const ALL: [DashboardResource; 4] = [
        DashboardResource::Orders,
        DashboardResource::Couriers,
        DashboardResource::Batches,
        DashboardResource::Stats,
    ];
}

impl Display for DashboardResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DashboardResource::Orders => "orders",
            DashboardResource::Couriers => "couriers",
            DashboardResource::Batches => "batches",
            DashboardResource::Stats => "stats",
        };
        f.write_str(name)
    }
}

/// One fetched resource.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardPayload {
    Orders(Vec<OrderSummary>),
    Couriers(Vec<CourierSummary>),
    Batches(Vec<BatchSummary>),
    Stats(DispatchStats),
}

impl DashboardPayload {
    pub fn resource(&self) -> DashboardResource {
        match self {
            DashboardPayload::Orders(_) => DashboardResource::Orders,
            DashboardPayload::Couriers(_) => DashboardResource::Couriers,
            DashboardPayload::Batches(_) => DashboardResource::Batches,
            DashboardPayload::Stats(_) => DashboardResource::Stats,
        }
    }

    pub fn empty(resource: DashboardResource) -> Self {
        match resource {
            DashboardResource::Orders => DashboardPayload::Orders(Vec::new()),
            DashboardResource::Couriers => DashboardPayload::Couriers(Vec::new()),
            DashboardResource::Batches => DashboardPayload::Batches(Vec::new()),
            DashboardResource::Stats => DashboardPayload::Stats(DispatchStats::default()),
        }
    }
}

/// Where dashboard data comes from.
#[async_trait]
pub trait DashboardSource: Send + Sync {
    async fn fetch(&self, resource: DashboardResource) -> Result<DashboardPayload, TransportError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardEvent {
    /// More orders are in progress than at the previous poll.
    NewActiveOrders { previous: usize, current: usize },
}

/// What the dashboard shows.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    pub orders: Vec<OrderSummary>,
    pub couriers: Vec<CourierSummary>,
    pub batches: Vec<BatchSummary>,
    pub stats: Option<DispatchStats>,
    /// False after a failed poll until the next successful one.
    pub connected: bool,
    pub active_orders: usize,
}

impl Default for DashboardSnapshot {
    fn default() -> Self {
        Self {
            orders: Vec::new(),
            couriers: Vec::new(),
            batches: Vec::new(),
            stats: None,
            connected: true,
            active_orders: 0,
        }
    }
}

#[derive(Default)]
struct StoreState {
    snapshot: DashboardSnapshot,
    gates: HashMap<DashboardResource, GenerationGate>,
    /// Resources whose latest fresh answer was a failure.
    failing: HashSet<DashboardResource>,
    orders_loaded: bool,
}

impl StoreState {
    fn set_health(&mut self, resource: DashboardResource, healthy: bool) {
        if healthy {
            self.failing.remove(&resource);
        } else {
            self.failing.insert(resource);
        }
        let connected = self.failing.is_empty();
        if connected != self.snapshot.connected {
            if connected {
                info!(%resource, "Dashboard reconnected");
            } else {
                warn!(%resource, "Dashboard disconnected");
            }
        }
        self.snapshot.connected = connected;
    }
}

/// Shared dashboard state. The lock is only held inside these methods.
pub struct DashboardStore {
    state: Mutex<StoreState>,
    events: broadcast::Sender<DashboardEvent>,
}

impl Default for DashboardStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            state: Mutex::new(StoreState::default()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        self.lock().snapshot.clone()
    }

    /// Takes the generation for a fetch of `resource`.
    pub fn issue(&self, resource: DashboardResource) -> u64 {
        self.lock().gates.entry(resource).or_default().issue()
    }

    /// Applies the answer of the fetch of `resource` tagged `generation`.
    pub fn apply(
        &self,
        resource: DashboardResource,
        generation: u64,
        result: Result<DashboardPayload, TransportError>,
    ) -> ApplyOutcome {
        let mut guard = self.lock();
        let state = &mut *guard;
        let gate = state.gates.entry(resource).or_default();

        let payload = match result {
            Err(e) => {
                if !gate.is_fresh(generation) {
                    debug!(%resource, generation, "Stale failure discarded");
                    return ApplyOutcome::Stale;
                }
                debug!(%resource, generation, error = %e, "Dashboard fetch failed");
                state.set_health(resource, false);
                return ApplyOutcome::Applied;
            }
            Ok(payload) => payload,
        };

        if !gate.try_apply(generation).is_applied() {
            debug!(%resource, generation, last = gate.last_applied(), "Stale result discarded");
            return ApplyOutcome::Stale;
        }
        state.set_health(resource, true);

        match payload {
            DashboardPayload::Orders(orders) => {
                let previous = state.snapshot.active_orders;
                let current = count_active(&orders);
                if state.orders_loaded && current > previous {
                    info!(previous, current, "New active orders");
                    // No subscribers is fine.
                    let _ = self.events.send(DashboardEvent::NewActiveOrders { previous, current });
                }
                state.orders_loaded = true;
                state.snapshot.active_orders = current;
                state.snapshot.orders = orders;
            }
            DashboardPayload::Couriers(couriers) => state.snapshot.couriers = couriers,
            DashboardPayload::Batches(batches) => state.snapshot.batches = batches,
            DashboardPayload::Stats(stats) => state.snapshot.stats = Some(stats),
        }
        debug!(%resource, generation, "Dashboard resource applied");
        ApplyOutcome::Applied
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
