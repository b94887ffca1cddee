//! # Map View Seam
//!
//! What a tracking session needs from a map widget: add and remove layers,
//! fit the viewport to a region, and release everything on close. The
//! session never reads the viewport back, so user pan/zoom is untouched
//! after the first fit.

use crate::geometry::{Bounds, Coordinate};
use crate::model::OrderStatus;
use std::collections::BTreeMap;

/// Handle of one layer on a map view.
pub type LayerId = u64;

#[derive(Debug, Clone, PartialEq)]
pub enum MarkerKind {
    /// The restaurant.
    Origin,
    /// A delivery stop, numbered from 1 in batch order.
    Stop {
        number: usize,
        /// The stop belongs to the order being tracked.
        current: bool,
        status: OrderStatus,
    },
    /// The courier's live position.
    Courier,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub kind: MarkerKind,
    pub position: Coordinate,
    /// Popup text.
    pub label: String,
}

impl Marker {
    pub fn new(kind: MarkerKind, position: Coordinate, label: impl Into<String>) -> Self {
        Self {
            kind,
            position,
            label: label.into(),
        }
    }
}

/// A map widget a tracking session draws on.
pub trait MapView: Send {
    fn add_marker(&mut self, marker: Marker) -> LayerId;

    fn add_route(&mut self, points: &[Coordinate]) -> LayerId;

    fn remove_layer(&mut self, layer: LayerId);

    /// Moves the viewport so `bounds` is visible with `padding` pixels around it.
    fn fit_bounds(&mut self, bounds: Bounds, padding: u32);

    /// Tears the widget down. No calls follow.
    fn release(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    Marker(Marker),
    Route(Vec<Coordinate>),
}

/// A headless [`MapView`] that keeps its layers in memory.
///
/// Used by the command line to print what a live map would show, and by
/// tests to assert on draw calls.
#[derive(Debug, Default)]
pub struct RecordingView {
    next_id: LayerId,
    layers: BTreeMap<LayerId, Layer>,
    fits: Vec<(Bounds, u32)>,
    removed: usize,
    released: bool,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.values()
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn markers(&self) -> Vec<&Marker> {
        self.layers
            .values()
            .filter_map(|layer| match layer {
                Layer::Marker(marker) => Some(marker),
                Layer::Route(_) => None,
            })
            .collect()
    }

    pub fn routes(&self) -> Vec<&[Coordinate]> {
        self.layers
            .values()
            .filter_map(|layer| match layer {
                Layer::Route(points) => Some(points.as_slice()),
                Layer::Marker(_) => None,
            })
            .collect()
    }

    pub fn courier_marker(&self) -> Option<&Marker> {
        self.markers()
            .into_iter()
            .find(|m| m.kind == MarkerKind::Courier)
    }

    pub fn fit_count(&self) -> usize {
        self.fits.len()
    }

    pub fn last_fit(&self) -> Option<&(Bounds, u32)> {
        self.fits.last()
    }

    pub fn removed_count(&self) -> usize {
        self.removed
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl MapView for RecordingView {
    fn add_marker(&mut self, marker: Marker) -> LayerId {
        self.next_id += 1;
        self.layers.insert(self.next_id, Layer::Marker(marker));
        self.next_id
    }

    fn add_route(&mut self, points: &[Coordinate]) -> LayerId {
        self.next_id += 1;
        self.layers.insert(self.next_id, Layer::Route(points.to_vec()));
        self.next_id
    }

    fn remove_layer(&mut self, layer: LayerId) {
        if self.layers.remove(&layer).is_some() {
            self.removed += 1;
        }
    }

    fn fit_bounds(&mut self, bounds: Bounds, padding: u32) {
        self.fits.push((bounds, padding));
    }

    fn release(&mut self) {
        self.released = true;
    }
}
