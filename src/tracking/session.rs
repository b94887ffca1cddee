//! # Live Tracking Session
//!
//! Owns one map view for one order, from the first detail fetch to close.
//!
//! ## State machine
//!
//! ```text
//! Pending --first successful fetch--> Live --close--> Closed
//!    |                                                  ^
//!    +----------------------close-----------------------+
//! ```
//!
//! - **Static layer** (origin, numbered stops, decoded route) is drawn once,
//!   on the transition to `Live`, and the viewport is fitted exactly then.
//! - **Live layer** is the courier marker alone. Each later fetch removes the
//!   previous marker and adds one at the new fix, if there is one.
//! - **Failures** keep whatever is drawn and mark the connection degraded.
//! - **Overlapping fetches** pass through a [`GenerationGate`], so a slow
//!   earlier answer never replaces a later one.
//!
//! A change in the batch's stops after the session went live does not redraw
//! the static layer; [`LiveTrackingSession::detail`] still shows the fresh
//! data and [`LiveTrackingSession::stops_changed`] reports the mismatch.

use super::view::{LayerId, MapView, Marker, MarkerKind};
use crate::clients::TransportError;
use crate::framework::GenerationGate;
use crate::geometry::{decode, Bounds, Coordinate, RouteGeometry};
use crate::model::{OrderId, TrackingDetail};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Viewport padding, in pixels, for the one-time fit.
pub const FIT_PADDING: u32 = 50;

/// Where tracking details come from.
#[async_trait]
pub trait TrackingSource: Send + Sync {
    async fn tracking_detail(&self, order_id: &OrderId) -> Result<TrackingDetail, TransportError>;
}

/// The restaurant every route starts from.
#[derive(Debug, Clone, PartialEq)]
pub struct Origin {
    pub name: String,
    pub position: Coordinate,
}

impl Origin {
    pub fn new(name: impl Into<String>, position: Coordinate) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No detail applied yet; nothing drawn.
    Pending,
    Live,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionHealth {
    Connected,
    /// The latest fetch failed; what is drawn may be out of date.
    Degraded,
}

/// What applying one fetch did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Static layer drawn and viewport fitted.
    Initialized,
    /// Courier marker moved.
    Updated,
    /// A later fetch was already applied.
    Stale,
    /// The fetch failed; nothing changed on the map.
    Degraded,
    /// The session is closed.
    Closed,
}

/// A fetch about to be issued, tagged with its generation.
///
/// Taken under the session lock and awaited without it, so the lock is never
/// held across the network call.
#[derive(Clone)]
pub struct RefreshTicket {
    pub generation: u64,
    order_id: OrderId,
    source: Arc<dyn TrackingSource>,
}

impl RefreshTicket {
    pub async fn fetch(&self) -> Result<TrackingDetail, TransportError> {
        self.source.tracking_detail(&self.order_id).await
    }
}

/// Tracking state for one order on one map view.
pub struct LiveTrackingSession<V: MapView> {
    order_id: OrderId,
    source: Arc<dyn TrackingSource>,
    origin: Origin,
    view: V,
    gate: GenerationGate,
    phase: SessionPhase,
    health: ConnectionHealth,
    route: RouteGeometry,
    static_layers: Vec<LayerId>,
    /// Stop ids the static layer was drawn with.
    drawn_stops: Vec<OrderId>,
    courier_layer: Option<LayerId>,
    fitted: bool,
    detail: Option<TrackingDetail>,
}

impl<V: MapView> LiveTrackingSession<V> {
    /// Creates a `Pending` session; nothing is fetched or drawn yet.
    pub fn new(order_id: OrderId, source: Arc<dyn TrackingSource>, origin: Origin, view: V) -> Self {
        Self {
            order_id,
            source,
            origin,
            view,
            gate: GenerationGate::new(),
            phase: SessionPhase::Pending,
            health: ConnectionHealth::Connected,
            route: RouteGeometry::new(),
            static_layers: Vec::new(),
            drawn_stops: Vec::new(),
            courier_layer: None,
            fitted: false,
            detail: None,
        }
    }

    /// Fetches the detail once and draws the static layer.
    ///
    /// On failure the session stays `Pending` and the next successful
    /// [`refresh`](Self::refresh) draws it instead.
    pub async fn open(&mut self) -> RefreshOutcome {
        info!(order_id = %self.order_id, "Opening tracking session");
        self.refresh().await
    }

    /// Fetches the detail and moves the courier marker.
    pub async fn refresh(&mut self) -> RefreshOutcome {
        let Some(ticket) = self.begin_refresh() else {
            return RefreshOutcome::Closed;
        };
        let result = ticket.fetch().await;
        self.apply_refresh(ticket.generation, result)
    }

    /// Takes a generation for a fetch. `None` once closed.
    pub fn begin_refresh(&mut self) -> Option<RefreshTicket> {
        if self.phase == SessionPhase::Closed {
            return None;
        }
        Some(RefreshTicket {
            generation: self.gate.issue(),
            order_id: self.order_id.clone(),
            source: Arc::clone(&self.source),
        })
    }

    /// Applies the answer of the fetch tagged `generation`.
    pub fn apply_refresh(
        &mut self,
        generation: u64,
        result: Result<TrackingDetail, TransportError>,
    ) -> RefreshOutcome {
        let order_id = &self.order_id;
        if self.phase == SessionPhase::Closed {
            debug!(%order_id, generation, "Result after close ignored");
            return RefreshOutcome::Closed;
        }

        match result {
            Err(e) => {
                if !self.gate.is_fresh(generation) {
                    debug!(%order_id, generation, "Stale failure discarded");
                    return RefreshOutcome::Stale;
                }
                warn!(%order_id, generation, error = %e, "Tracking refresh failed");
                self.health = ConnectionHealth::Degraded;
                RefreshOutcome::Degraded
            }
            Ok(detail) => {
                if !self.gate.try_apply(generation).is_applied() {
                    debug!(%order_id, generation, last = self.gate.last_applied(), "Stale result discarded");
                    return RefreshOutcome::Stale;
                }
                if self.health == ConnectionHealth::Degraded {
                    info!(%order_id, "Tracking connection restored");
                }
                self.health = ConnectionHealth::Connected;

                let outcome = if self.phase == SessionPhase::Pending {
                    self.draw_static(&detail);
                    self.phase = SessionPhase::Live;
                    RefreshOutcome::Initialized
                } else {
                    if !self.stops_changed() && !self.matches_drawn_stops(&detail) {
                        info!(order_id = %self.order_id, "Batch stops changed; static layer kept");
                    }
                    RefreshOutcome::Updated
                };
                self.move_courier(&detail);
                self.detail = Some(detail);
                outcome
            }
        }
    }

    /// Removes every layer and releases the view. Safe to call repeatedly.
    pub fn close(&mut self) {
        if self.phase == SessionPhase::Closed {
            return;
        }
        for layer in self.static_layers.drain(..) {
            self.view.remove_layer(layer);
        }
        if let Some(layer) = self.courier_layer.take() {
            self.view.remove_layer(layer);
        }
        self.view.release();
        self.phase = SessionPhase::Closed;
        info!(order_id = %self.order_id, "Tracking session closed");
    }

    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn health(&self) -> ConnectionHealth {
        self.health
    }

    /// The latest applied detail.
    pub fn detail(&self) -> Option<&TrackingDetail> {
        self.detail.as_ref()
    }

    /// The decoded route; empty if none was sent or it was malformed.
    pub fn route(&self) -> &[Coordinate] {
        &self.route
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    /// True when the latest detail's stops differ from the drawn ones.
    pub fn stops_changed(&self) -> bool {
        self.detail
            .as_ref()
            .is_some_and(|detail| !self.matches_drawn_stops(detail))
    }

    fn matches_drawn_stops(&self, detail: &TrackingDetail) -> bool {
        detail.stop_ids().into_iter().eq(self.drawn_stops.iter())
    }

    fn draw_static(&mut self, detail: &TrackingDetail) {
        let mut bounds = Bounds::new();

        let origin = Marker::new(MarkerKind::Origin, self.origin.position, self.origin.name.clone());
        bounds.extend(origin.position);
        self.static_layers.push(self.view.add_marker(origin));

        let stops = detail.stops();
        self.drawn_stops = detail.stop_ids().into_iter().cloned().collect();
        if stops.is_empty() {
            // Not batched yet: the order's own destination stands in for the stop list.
            if let (Some(lat), Some(lng)) = (detail.order.lat, detail.order.lng) {
                let marker = Marker::new(
                    MarkerKind::Stop {
                        number: 1,
                        current: true,
                        status: detail.order.status,
                    },
                    Coordinate::new(lat, lng),
                    detail.order.customer_name.clone(),
                );
                bounds.extend(marker.position);
                self.static_layers.push(self.view.add_marker(marker));
            }
        }
        for (index, stop) in stops.iter().enumerate() {
            let marker = Marker::new(
                MarkerKind::Stop {
                    number: index + 1,
                    current: stop.id == detail.order.id,
                    status: stop.status,
                },
                stop.position(),
                format!("{} - {}", stop.customer_name, stop.address_text),
            );
            bounds.extend(marker.position);
            self.static_layers.push(self.view.add_marker(marker));
        }

        match decode(detail.encoded_route()) {
            Ok(points) if !points.is_empty() => {
                points.iter().for_each(|p| bounds.extend(*p));
                self.static_layers.push(self.view.add_route(&points));
                self.route = points;
            }
            Ok(_) => {}
            Err(e) => warn!(order_id = %self.order_id, error = %e, "Route not drawn"),
        }

        if let Some(position) = detail.courier_position() {
            bounds.extend(position);
        }

        if !self.fitted && !bounds.is_empty() {
            self.view.fit_bounds(bounds, FIT_PADDING);
            self.fitted = true;
        }
        debug!(
            order_id = %self.order_id,
            stops = stops.len(),
            route_points = self.route.len(),
            "Static layer drawn"
        );
    }

    fn move_courier(&mut self, detail: &TrackingDetail) {
        if let Some(layer) = self.courier_layer.take() {
            self.view.remove_layer(layer);
        }
        if let (Some(courier), Some(position)) = (detail.courier.as_ref(), detail.courier_position()) {
            let marker = Marker::new(MarkerKind::Courier, position, courier.name.clone());
            self.courier_layer = Some(self.view.add_marker(marker));
        }
    }
}
