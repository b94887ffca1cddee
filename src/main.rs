//! # Dispatch Console CLI
//!
//! Drives the coordination engine from a terminal against a running console
//! backend and the public lookup providers.
//!
//! ```bash
//! dispatch-console postal 14090-000
//! dispatch-console places street "Rua Amador" --city "Ribeirão Preto"
//! dispatch-console search customer a an ana
//! dispatch-console dashboard --ticks 3
//! dispatch-console track 6f1c2a --ticks 2
//! dispatch-console dispatch
//! ```

use clap::{Parser, Subcommand};
use dispatch_console::address::{PlaceKind, PostalLookup};
use dispatch_console::config::ConsoleConfig;
use dispatch_console::error::ConsoleError;
use dispatch_console::framework::{ResolverClient, ResolverPhase, ResolverState};
use dispatch_console::lifecycle::{setup_tracing, ConsoleSystem, SearchField};
use dispatch_console::model::OrderId;
use dispatch_console::polling::DashboardEvent;
use dispatch_console::tracking::{MarkerKind, RecordingView};
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::info;

/// Pause between simulated keystrokes.
const KEYSTROKE_GAP: Duration = Duration::from_millis(60);

#[derive(Debug, Parser)]
#[command(name = "dispatch-console")]
#[command(about = "Restaurant dispatch console coordination engine", long_about = None)]
struct Cli {
    /// TOML config file; defaults apply when omitted.
    #[arg(long, global = true, env = "DISPATCH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve a postal code into street, neighborhood and city.
    Postal { code: String },

    /// Suggest values for one address field.
    Places {
        /// street, neighborhood or city
        kind: PlaceKind,
        text: String,
        /// City used to narrow street and neighborhood searches.
        #[arg(long, default_value = "")]
        city: String,
    },

    /// Feed a keystroke burst to a field's resolver and print what it settles on.
    Search {
        /// customer, menu, tracking, street, neighborhood or city
        field: String,
        /// Successive field contents, e.g. `a an ana`.
        #[arg(required = true)]
        texts: Vec<String>,
    },

    /// Poll the dashboard and print each refresh.
    Dashboard {
        #[arg(long, default_value_t = 3)]
        ticks: u32,
    },

    /// Open a live tracking view for an order.
    Track {
        order_id: String,
        /// Refreshes to wait for after opening.
        #[arg(long, default_value_t = 2)]
        ticks: u32,
    },

    /// Run the server-side batch assignment.
    Dispatch,
}

#[tokio::main]
async fn main() -> Result<(), ConsoleError> {
    setup_tracing();
    let cli = Cli::parse();

    let config = ConsoleConfig::load(cli.config.as_deref())?;
    let system = ConsoleSystem::new(config)?;
    info!("Starting dispatch console");

    match cli.command {
        Command::Postal { code } => postal(&system, &code).await,
        Command::Places { kind, text, city } => {
            let suggestions = system.pipeline.suggest_places(&text, kind, &city).await;
            print_labels(suggestions.iter().map(|s| s.label.as_str()));
        }
        Command::Search { field, texts } => search(&system, &field, &texts).await?,
        Command::Dashboard { ticks } => dashboard(&system, ticks).await,
        Command::Track { order_id, ticks } => track(&system, order_id, ticks).await,
        Command::Dispatch => {
            let summary = system.run_dispatch().await?;
            println!(
                "{} (batches: {}, orders: {})",
                summary.message, summary.batches_created, summary.orders_assigned
            );
        }
    }

    system.shutdown().await
}

async fn postal(system: &ConsoleSystem, code: &str) {
    let mut form = system.address_form();
    form.set_postal_code(code);
    match form.apply_postal_code().await {
        PostalLookup::Found(record) => {
            let fields = form.fields();
            println!("{}", fields.postal_code);
            println!("  street:       {}", fields.street);
            println!("  neighborhood: {}", fields.neighborhood);
            println!("  city:         {}", fields.city);
            if let Some(state) = record.state {
                println!("  state:        {state}");
            }
        }
        PostalLookup::NotFound => println!("{}: not found", form.fields().postal_code),
    }
}

async fn search(system: &ConsoleSystem, field: &str, texts: &[String]) -> Result<(), ConsoleError> {
    let settle = system.config().debounce() + system.config().timeout();

    if let Ok(kind) = field.parse::<PlaceKind>() {
        let form = system.address_form();
        let state = burst(form.resolver(kind), texts, settle).await?;
        print_labels(state.labels());
        return Ok(());
    }

    let field: SearchField = field.parse().map_err(ConsoleError::Usage)?;
    let state = burst(system.resolver(field), texts, settle).await?;
    print_labels(state.labels());
    Ok(())
}

/// Submits each text as a keystroke, then waits for the resolver to settle.
async fn burst(
    resolver: &ResolverClient,
    texts: &[String],
    settle: Duration,
) -> Result<ResolverState, ConsoleError> {
    let mut updates = resolver.subscribe();
    for text in texts {
        resolver.submit(text.as_str()).await?;
        sleep(KEYSTROKE_GAP).await;
    }

    let settled = timeout(settle, async {
        loop {
            let state = updates.borrow_and_update().clone();
            if state.phase == ResolverPhase::Idle {
                return Ok(state);
            }
            if updates.changed().await.is_err() {
                return Err(ConsoleError::Task("resolver stopped".into()));
            }
        }
    })
    .await;

    match settled {
        Ok(state) => state,
        Err(_) => Ok(resolver.snapshot().await?),
    }
}

async fn dashboard(system: &ConsoleSystem, ticks: u32) {
    let mut events = system.store.subscribe();
    let period = system.config().polling_config().dashboard_interval;
    let handle = system.mount_dashboard();

    for tick in 1..=ticks {
        sleep(if tick == 1 { Duration::from_secs(1) } else { period }).await;
        let snapshot = system.store.snapshot();
        let pending = snapshot.stats.as_ref().map_or(0, |s| s.pending_orders);
        println!(
            "[{tick}] {} | orders: {} ({} active, {} pending) | couriers: {} | batches: {}",
            if snapshot.connected { "connected" } else { "DISCONNECTED" },
            snapshot.orders.len(),
            snapshot.active_orders,
            pending,
            snapshot.couriers.len(),
            snapshot.batches.len(),
        );
        while let Ok(DashboardEvent::NewActiveOrders { previous, current }) = events.try_recv() {
            println!("    new orders: {previous} -> {current} active");
        }
    }

    handle.unmount().await;
}

async fn track(system: &ConsoleSystem, order_id: String, ticks: u32) {
    let period = system.config().polling_config().tracking_interval;
    let tracking = system.open_tracking(OrderId::from(order_id), RecordingView::new()).await;
    println!("open: {:?}", tracking.opened);

    {
        let session = tracking.session.lock().await;
        for marker in session.view().markers() {
            let kind = match &marker.kind {
                MarkerKind::Origin => "origin".to_string(),
                MarkerKind::Stop { number, current, .. } => {
                    format!("stop {number}{}", if *current { " *" } else { "" })
                }
                MarkerKind::Courier => "courier".to_string(),
            };
            println!("  {kind:<10} {} {}", marker.position, marker.label);
        }
        println!("  route: {} points", session.route().len());
    }

    for tick in 1..=ticks {
        sleep(period + Duration::from_millis(500)).await;
        let session = tracking.session.lock().await;
        let courier = session
            .view()
            .courier_marker()
            .map_or_else(|| "no fix".to_string(), |m| m.position.to_string());
        let status = session
            .detail()
            .map_or_else(|| "-".to_string(), |d| format!("{:?}", d.order.status));
        println!("[{tick}] {:?} | courier {courier} | order {status}", session.health());
    }

    tracking.close().await;
}

fn print_labels<'a>(labels: impl IntoIterator<Item = &'a str>) {
    let mut any = false;
    for label in labels {
        println!("{label}");
        any = true;
    }
    if !any {
        println!("(no suggestions)");
    }
}
