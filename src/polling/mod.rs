//! Fixed-interval polling for the dashboard and open tracking sessions.
//!
//! See the [`mock`] module for a scripted dashboard source.

pub mod dashboard;
pub mod mock;
pub mod stream;

pub use dashboard::{
    DashboardEvent, DashboardPayload, DashboardResource, DashboardSnapshot, DashboardSource,
    DashboardStore,
};
pub use stream::{PollHandle, PollingConfig, PollingLoop};
