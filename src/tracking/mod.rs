//! Live map tracking for a single order.
//!
//! - [`LiveTrackingSession`] - one view's lifecycle: static layer once,
//!   courier marker on every refresh
//! - [`MapView`] - the map widget seam; [`RecordingView`] is the headless one
//! - [`TrackingSource`] - where details come from
//!
//! See the [`mock`] module for a scripted source.

pub mod mock;
pub mod session;
pub mod view;

pub use session::{
    ConnectionHealth, LiveTrackingSession, Origin, RefreshOutcome, RefreshTicket, SessionPhase,
    TrackingSource, FIT_PADDING,
};
pub use view::{Layer, LayerId, MapView, Marker, MarkerKind, RecordingView};
