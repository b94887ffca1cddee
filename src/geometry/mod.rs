//! # Geometry
//!
//! Plain coordinate types shared by the tracking session and the lookup
//! providers, plus the encoded route codec in [`polyline`].

pub mod polyline;

pub use polyline::{decode, encode, GeometryError};

use serde::{Deserialize, Serialize};

/// A WGS84 position in floating point degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lat, self.lng)
    }
}

/// Ordered route points decoded once per tracking session.
pub type RouteGeometry = Vec<Coordinate>;

/// Axis-aligned bounding region over a set of coordinates.
///
/// Starts empty; [`Bounds::extend`] grows it one point at a time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    corners: Option<(Coordinate, Coordinate)>,
}

impl Bounds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, point: Coordinate) {
        self.corners = Some(match self.corners {
            None => (point, point),
            Some((sw, ne)) => (
                Coordinate::new(sw.lat.min(point.lat), sw.lng.min(point.lng)),
                Coordinate::new(ne.lat.max(point.lat), ne.lng.max(point.lng)),
            ),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.corners.is_none()
    }

    pub fn south_west(&self) -> Option<Coordinate> {
        self.corners.map(|(sw, _)| sw)
    }

    pub fn north_east(&self) -> Option<Coordinate> {
        self.corners.map(|(_, ne)| ne)
    }

    pub fn contains(&self, point: Coordinate) -> bool {
        match self.corners {
            None => false,
            Some((sw, ne)) => {
                point.lat >= sw.lat && point.lat <= ne.lat && point.lng >= sw.lng && point.lng <= ne.lng
            }
        }
    }
}

impl FromIterator<Coordinate> for Bounds {
    fn from_iter<I: IntoIterator<Item = Coordinate>>(iter: I) -> Self {
        let mut bounds = Bounds::new();
        for point in iter {
            bounds.extend(point);
        }
        bounds
    }
}
