//! # Polling Loop
//!
//! Fixed-interval drivers for the two polled views.
//!
//! | Stream    | Period (default) | First tick            | Feeds                  |
//! |-----------|------------------|-----------------------|------------------------|
//! | Dashboard | 5 s              | on mount              | [`DashboardStore`]     |
//! | Tracking  | 10 s             | one period after mount | [`LiveTrackingSession`] |
//!
//! Every tick takes a generation per resource before fetching, and fetches
//! run concurrently in a [`JoinSet`], so a slow answer may land after the
//! next tick's. The generation gates on the receiving side decide what is
//! applied.
//!
//! A stream runs until its [`PollHandle`] is unmounted or dropped. Either way
//! the stream's in-flight fetches are aborted with it.

use super::dashboard::{DashboardResource, DashboardSource, DashboardStore};
use crate::tracking::{LiveTrackingSession, MapView};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Periods of the two streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingConfig {
    pub dashboard_interval: Duration,
    pub tracking_interval: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            dashboard_interval: Duration::from_secs(5),
            tracking_interval: Duration::from_secs(10),
        }
    }
}

/// A mounted stream. Dropping the handle stops the stream.
pub struct PollHandle {
    name: &'static str,
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Stops the stream and waits for it to exit.
    pub async fn unmount(mut self) {
        self.stop.take();
        if let Err(e) = (&mut self.task).await {
            warn!(stream = self.name, error = %e, "Polling task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Mounts polling streams with the configured periods.
#[derive(Debug, Clone, Copy, Default)]
pub struct PollingLoop {
    config: PollingConfig,
}

impl PollingLoop {
    pub fn new(config: PollingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> PollingConfig {
        self.config
    }

    /// Polls all dashboard resources into `store`, starting now.
    pub fn mount_dashboard(&self, source: Arc<dyn DashboardSource>, store: Arc<DashboardStore>) -> PollHandle {
        let (stop_tx, mut stop) = oneshot::channel::<()>();
        let period = self.config.dashboard_interval;

        let task = tokio::spawn(async move {
            info!(?period, "Dashboard polling mounted");
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut in_flight = JoinSet::new();

            loop {
                tokio::select! {
                    biased;

                    _ = &mut stop => break,
                    Some(joined) = in_flight.join_next() => match joined {
                        Ok((resource, generation, result)) => {
                            store.apply(resource, generation, result);
                        }
                        Err(e) => warn!(error = %e, "Dashboard fetch task failed"),
                    },
                    _ = ticker.tick() => {
                        for resource in DashboardResource::ALL {
                            let generation = store.issue(resource);
                            let source = Arc::clone(&source);
                            debug!(%resource, generation, "Dashboard fetch issued");
                            in_flight.spawn(async move {
                                (resource, generation, source.fetch(resource).await)
                            });
                        }
                    }
                }
            }

            info!(aborted = in_flight.len(), "Dashboard polling unmounted");
        });

        PollHandle {
            name: "dashboard",
            stop: Some(stop_tx),
            task,
        }
    }

    /// Refreshes an open session every period, starting one period from now.
    /// The stream ends on its own once the session is closed.
    pub fn mount_tracking<V>(&self, session: Arc<Mutex<LiveTrackingSession<V>>>) -> PollHandle
    where
        V: MapView + 'static,
    {
        let (stop_tx, mut stop) = oneshot::channel::<()>();
        let period = self.config.tracking_interval;

        let task = tokio::spawn(async move {
            let order_id = session.lock().await.order_id().clone();
            info!(%order_id, ?period, "Tracking polling mounted");
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut in_flight = JoinSet::new();

            loop {
                tokio::select! {
                    biased;

                    _ = &mut stop => break,
                    Some(joined) = in_flight.join_next() => match joined {
                        Ok((generation, result)) => {
                            let outcome = session.lock().await.apply_refresh(generation, result);
                            debug!(%order_id, generation, ?outcome, "Tracking refresh applied");
                        }
                        Err(e) => warn!(%order_id, error = %e, "Tracking fetch task failed"),
                    },
                    _ = ticker.tick() => {
                        let Some(ticket) = session.lock().await.begin_refresh() else {
                            debug!(%order_id, "Session closed");
                            break;
                        };
                        in_flight.spawn(async move {
                            let result = ticket.fetch().await;
                            (ticket.generation, result)
                        });
                    }
                }
            }

            info!(%order_id, aborted = in_flight.len(), "Tracking polling unmounted");
        });

        PollHandle {
            name: "tracking",
            stop: Some(stop_tx),
            task,
        }
    }
}
