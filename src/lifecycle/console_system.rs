use crate::address::{AddressForm, AddressLookupPipeline};
use crate::clients::{ConsoleApi, HttpTransport, PhotonClient, ReqwestTransport, ViaCepClient};
use crate::config::ConsoleConfig;
use crate::error::ConsoleError;
use crate::framework::{Fetcher, QueryResolver, ResolverClient, ResolverConfig};
use crate::model::{DispatchSummary, OrderId};
use crate::polling::{DashboardStore, PollHandle, PollingLoop};
use crate::search::{CustomerFetcher, MenuItemFetcher, TrackingSearchFetcher};
use crate::tracking::{LiveTrackingSession, MapView, RefreshOutcome};
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// The console's non-address lookup fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Customer,
    Menu,
    Tracking,
}

impl Display for SearchField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SearchField::Customer => "customer",
            SearchField::Menu => "menu",
            SearchField::Tracking => "tracking",
        };
        f.write_str(name)
    }
}

impl FromStr for SearchField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(SearchField::Customer),
            "menu" | "menu_item" => Ok(SearchField::Menu),
            "tracking" => Ok(SearchField::Tracking),
            other => Err(format!("unknown search field: {other}")),
        }
    }
}

/// An open tracking view with its polling stream.
pub struct TrackingHandle<V: MapView> {
    pub session: Arc<Mutex<LiveTrackingSession<V>>>,
    /// Outcome of the initial fetch.
    pub opened: RefreshOutcome,
    pub polling: PollHandle,
}

impl<V: MapView + 'static> TrackingHandle<V> {
    /// Stops polling, then closes the session.
    pub async fn close(self) {
        self.polling.unmount().await;
        self.session.lock().await.close();
    }
}

/// The runtime orchestrator for the dispatch console.
///
/// `ConsoleSystem` is responsible for:
/// - **Wiring**: one HTTP transport for the console API (with the bearer
///   token) and one for the public lookup providers (without it)
/// - **Resolvers**: spawning a [`QueryResolver`] for each search field
/// - **Polling**: mounting the dashboard stream and tracking views
/// - **Shutdown**: closing every resolver and waiting for it to exit
///
/// # Example
///
/// ```no_run
/// use dispatch_console::config::ConsoleConfig;
/// use dispatch_console::lifecycle::{ConsoleSystem, SearchField};
///
/// # async fn run() -> Result<(), dispatch_console::error::ConsoleError> {
/// let system = ConsoleSystem::new(ConsoleConfig::default())?;
/// system.resolver(SearchField::Customer).submit("ana").await?;
/// system.shutdown().await?;
/// # Ok(())
/// # }
/// ```
pub struct ConsoleSystem {
    pub api: ConsoleApi,
    pub pipeline: AddressLookupPipeline,
    /// Dashboard state fed by [`ConsoleSystem::mount_dashboard`].
    pub store: Arc<DashboardStore>,
    customers: CustomerFetcher,
    customer_search: ResolverClient,
    menu_search: ResolverClient,
    tracking_search: ResolverClient,
    polling: PollingLoop,
    config: ConsoleConfig,
    handles: Vec<JoinHandle<()>>,
}

impl ConsoleSystem {
    /// Builds the system over real HTTP transports.
    pub fn new(config: ConsoleConfig) -> Result<Self, ConsoleError> {
        let console = ReqwestTransport::new(config.timeout())?.with_bearer(config.api.token.clone());
        let lookups = ReqwestTransport::new(config.timeout())?;
        Ok(Self::with_transports(config, Arc::new(console), Arc::new(lookups)))
    }

    /// Builds the system over injected transports.
    pub fn with_transports(
        config: ConsoleConfig,
        console: Arc<dyn HttpTransport>,
        lookups: Arc<dyn HttpTransport>,
    ) -> Self {
        let api = ConsoleApi::new(console, config.api.base_url.clone())
            .with_orders_limit(config.polling.orders_limit);
        let pipeline = AddressLookupPipeline::new(
            Arc::new(ViaCepClient::new(lookups.clone(), config.geocoding.postal_url.clone())),
            Arc::new(PhotonClient::new(lookups, config.geocoding.place_search_url.clone())),
            config.place_settings(),
        );

        let debounce = config.debounce();
        let settings = &config.resolver;
        let customers = CustomerFetcher::new(api.clone());
        let mut handles = Vec::new();

        let customer_search = spawn_resolver(
            ResolverConfig::new("customer", debounce, settings.customer_min_length),
            customers.clone(),
            &mut handles,
        );
        let menu_search = spawn_resolver(
            ResolverConfig::new("menu", debounce, settings.menu_min_length),
            MenuItemFetcher::new(api.clone()),
            &mut handles,
        );
        let tracking_search = spawn_resolver(
            ResolverConfig::new("tracking", debounce, settings.tracking_min_length),
            TrackingSearchFetcher::new(api.clone(), config.polling.orders_limit),
            &mut handles,
        );

        info!(api = %config.api.base_url, "Console system ready");
        Self {
            api,
            pipeline,
            store: Arc::new(DashboardStore::new()),
            customers,
            customer_search,
            menu_search,
            tracking_search,
            polling: PollingLoop::new(config.polling_config()),
            config,
            handles,
        }
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn resolver(&self, field: SearchField) -> &ResolverClient {
        match field {
            SearchField::Customer => &self.customer_search,
            SearchField::Menu => &self.menu_search,
            SearchField::Tracking => &self.tracking_search,
        }
    }

    /// The phone shortcut of the customer field.
    pub fn customers(&self) -> &CustomerFetcher {
        &self.customers
    }

    /// A fresh address form with its own street/neighborhood/city resolvers.
    pub fn address_form(&self) -> AddressForm {
        AddressForm::new(
            self.pipeline.clone(),
            self.config.debounce(),
            self.config.resolver.address_min_length,
        )
    }

    /// Starts polling the dashboard into [`ConsoleSystem::store`].
    pub fn mount_dashboard(&self) -> PollHandle {
        self.polling
            .mount_dashboard(Arc::new(self.api.clone()), Arc::clone(&self.store))
    }

    /// Opens a tracking view for `order_id` on `view` and starts refreshing it.
    pub async fn open_tracking<V>(&self, order_id: OrderId, view: V) -> TrackingHandle<V>
    where
        V: MapView + 'static,
    {
        let mut session =
            LiveTrackingSession::new(order_id, Arc::new(self.api.clone()), self.config.origin(), view);
        let opened = session.open().await;
        let session = Arc::new(Mutex::new(session));
        let polling = self.polling.mount_tracking(Arc::clone(&session));
        TrackingHandle {
            session,
            opened,
            polling,
        }
    }

    pub async fn run_dispatch(&self) -> Result<DispatchSummary, ConsoleError> {
        Ok(self.api.run_dispatch().await?)
    }

    /// Closes every resolver and waits for its task to finish.
    ///
    /// Clients cloned out of the system keep their resolver alive; drop them
    /// first or this waits for them.
    pub async fn shutdown(self) -> Result<(), ConsoleError> {
        info!("Shutting down console...");

        drop(self.customer_search);
        drop(self.menu_search);
        drop(self.tracking_search);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Resolver task failed: {:?}", e);
                return Err(ConsoleError::Task(e.to_string()));
            }
        }

        info!("Console shutdown complete.");
        Ok(())
    }
}

fn spawn_resolver<F: Fetcher>(
    config: ResolverConfig,
    fetcher: F,
    handles: &mut Vec<JoinHandle<()>>,
) -> ResolverClient {
    let (actor, client) = QueryResolver::new(config, fetcher);
    handles.push(tokio::spawn(actor.run()));
    client
}
