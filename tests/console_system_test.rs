use async_trait::async_trait;
use dispatch_console::address::{PlaceKind, PostalLookup};
use dispatch_console::clients::http::Query;
use dispatch_console::clients::{HttpTransport, TransportError};
use dispatch_console::config::ConsoleConfig;
use dispatch_console::lifecycle::{ConsoleSystem, SearchField};
use dispatch_console::model::{OrderId, OrderStatus};
use dispatch_console::polling::mock::order;
use dispatch_console::polling::DashboardEvent;
use dispatch_console::tracking::mock::detail_fixture;
use dispatch_console::tracking::{ConnectionHealth, RecordingView, RefreshOutcome};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

const API: &str = "http://console.test/api";
const POSTAL: &str = "http://postal.test/ws";

type Reply = (Duration, Result<Vec<u8>, TransportError>);

#[derive(Default)]
struct Routes {
    replies: HashMap<String, VecDeque<Reply>>,
    requests: Vec<String>,
}

/// Answers by URL (plus query string). The last queued reply of a route is
/// repeated; unknown routes answer 404.
#[derive(Clone, Default)]
struct RoutedTransport {
    routes: Arc<Mutex<Routes>>,
}

impl RoutedTransport {
    fn respond(&self, route: &str, body: Value) {
        self.respond_after(route, Duration::ZERO, body);
    }

    fn respond_after(&self, route: &str, delay: Duration, body: Value) {
        let bytes = serde_json::to_vec(&body).unwrap();
        self.push(route, (delay, Ok(bytes)));
    }

    fn fail(&self, route: &str, status: u16) {
        let error = TransportError::Status {
            status,
            url: route.to_string(),
        };
        self.push(route, (Duration::ZERO, Err(error)));
    }

    fn push(&self, route: &str, reply: Reply) {
        self.routes
            .lock()
            .unwrap()
            .replies
            .entry(route.to_string())
            .or_default()
            .push_back(reply);
    }

    fn requests_to(&self, prefix: &str) -> Vec<String> {
        self.routes
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|r| r.starts_with(prefix))
            .cloned()
            .collect()
    }

    async fn answer(&self, route: String) -> Result<Vec<u8>, TransportError> {
        let reply = {
            let mut routes = self.routes.lock().unwrap();
            routes.requests.push(route.clone());
            routes.replies.get_mut(&route).and_then(|queue| {
                if queue.len() > 1 {
                    queue.pop_front()
                } else {
                    queue.front().cloned()
                }
            })
        };
        match reply {
            Some((delay, result)) => {
                sleep(delay).await;
                result
            }
            None => Err(TransportError::Status {
                status: 404,
                url: route,
            }),
        }
    }
}

#[async_trait]
impl HttpTransport for RoutedTransport {
    async fn get(&self, url: &str, query: Query<'_>) -> Result<Vec<u8>, TransportError> {
        let route = if query.is_empty() {
            url.to_string()
        } else {
            let pairs: Vec<String> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
            format!("{url}?{}", pairs.join("&"))
        };
        self.answer(route).await
    }

    async fn post(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        self.answer(url.to_string()).await
    }
}

fn config() -> ConsoleConfig {
    let mut config = ConsoleConfig::default();
    config.api.base_url = API.to_string();
    config.geocoding.postal_url = POSTAL.to_string();
    config
}

fn system(console: &RoutedTransport, lookups: &RoutedTransport) -> ConsoleSystem {
    ConsoleSystem::with_transports(config(), Arc::new(console.clone()), Arc::new(lookups.clone()))
}

fn customer(id: &str, name: &str, phone: &str) -> Value {
    json!({ "id": id, "name": name, "phone": phone })
}

#[tokio::test(start_paused = true)]
async fn test_customer_keystroke_burst_sends_one_request() {
    let console = RoutedTransport::default();
    console.respond(
        &format!("{API}/customers?search=ana"),
        json!([customer("c-1", "Ana Souza", "16999990000")]),
    );
    let system = system(&console, &RoutedTransport::default());
    let field = system.resolver(SearchField::Customer);

    for text in ["a", "an", "ana"] {
        field.submit(text).await.unwrap();
        sleep(Duration::from_millis(80)).await;
    }
    sleep(Duration::from_secs(1)).await;

    assert_eq!(
        console.requests_to(&format!("{API}/customers")),
        vec![format!("{API}/customers?search=ana")]
    );
    let state = field.snapshot().await.unwrap();
    assert_eq!(state.labels(), vec!["Ana Souza (16) 99999-0000"]);

    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_slow_customer_answer_is_discarded() {
    let console = RoutedTransport::default();
    console.respond_after(
        &format!("{API}/customers?search=ana"),
        Duration::from_millis(900),
        json!([customer("c-1", "Ana Souza", "16999990000")]),
    );
    console.respond_after(
        &format!("{API}/customers?search=ana paula"),
        Duration::from_millis(20),
        json!([customer("c-2", "Ana Paula", "1633334444")]),
    );
    let system = system(&console, &RoutedTransport::default());
    let field = system.resolver(SearchField::Customer);

    field.submit("ana").await.unwrap();
    sleep(Duration::from_millis(400)).await;
    field.submit("ana paula").await.unwrap();
    sleep(Duration::from_secs(2)).await;

    let state = field.snapshot().await.unwrap();
    assert_eq!(state.labels(), vec!["Ana Paula (16) 3333-4444"]);
    assert_eq!(state.fetches_issued, 2);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_postal_code_fills_address_form() {
    let lookups = RoutedTransport::default();
    lookups.respond(
        &format!("{POSTAL}/14090000/json/"),
        json!({
            "cep": "14090-000",
            "logradouro": "Rua Amador Bueno",
            "bairro": "Centro",
            "localidade": "Ribeirão Preto",
            "uf": "SP"
        }),
    );
    let system = system(&RoutedTransport::default(), &lookups);
    let mut form = system.address_form();

    form.set_postal_code("14090000");
    assert_eq!(form.fields().postal_code, "14090-000");
    assert!(form.apply_postal_code().await.is_found());

    form.fields_mut().number = "120".to_string();
    assert_eq!(
        form.full_address(),
        "Rua Amador Bueno, 120 - Centro, Ribeirão Preto"
    );

    drop(form);
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unknown_postal_code_keeps_typed_fields() {
    let lookups = RoutedTransport::default();
    lookups.respond(&format!("{POSTAL}/99999999/json/"), json!({ "erro": true }));
    let system = system(&RoutedTransport::default(), &lookups);
    let mut form = system.address_form();

    form.type_into(PlaceKind::Street, "Rua Sete").await.unwrap();
    form.set_postal_code("99999-999");

    assert_eq!(form.apply_postal_code().await, PostalLookup::NotFound);
    assert_eq!(form.fields().street, "Rua Sete");
    assert!(form.fields().city.is_empty());

    drop(form);
    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_dashboard_announces_new_active_orders() {
    let console = RoutedTransport::default();
    let orders = format!("{API}/orders?limit=50");
    console.respond(&orders, json!([order("o-1", OrderStatus::Created)]));
    console.respond(
        &orders,
        json!([
            order("o-1", OrderStatus::Created),
            order("o-2", OrderStatus::Preparing),
            order("o-0", OrderStatus::Delivered),
        ]),
    );
    console.respond(&format!("{API}/couriers"), json!([]));
    console.respond(&format!("{API}/dispatch/batches"), json!([]));
    console.respond(&format!("{API}/dispatch/stats"), json!({ "pending_orders": 2 }));
    let system = system(&console, &RoutedTransport::default());
    let mut events = system.store.subscribe();

    let dashboard = system.mount_dashboard();
    sleep(Duration::from_millis(100)).await;
    assert_eq!(system.store.snapshot().active_orders, 1);
    assert!(events.try_recv().is_err());

    sleep(Duration::from_secs(5)).await;
    let snapshot = system.store.snapshot();
    assert!(snapshot.connected);
    assert_eq!(snapshot.orders.len(), 3);
    assert_eq!(snapshot.stats.map(|s| s.pending_orders), Some(2));
    assert_eq!(
        events.try_recv().unwrap(),
        DashboardEvent::NewActiveOrders {
            previous: 1,
            current: 2
        }
    );

    dashboard.unmount().await;
    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_dashboard_reports_outage_and_recovery() {
    let console = RoutedTransport::default();
    let routes = [
        (format!("{API}/orders?limit=50"), json!([])),
        (format!("{API}/couriers"), json!([])),
        (format!("{API}/dispatch/batches"), json!([])),
        (format!("{API}/dispatch/stats"), json!({})),
    ];
    for (route, recovered) in routes {
        console.fail(&route, 503);
        console.respond(&route, recovered);
    }
    let system = system(&console, &RoutedTransport::default());

    let dashboard = system.mount_dashboard();
    sleep(Duration::from_millis(100)).await;
    assert!(!system.store.snapshot().connected);

    sleep(Duration::from_secs(5)).await;
    assert!(system.store.snapshot().connected);

    dashboard.unmount().await;
    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_tracking_view_follows_courier() {
    let console = RoutedTransport::default();
    let detail = format!("{API}/orders/o-2/tracking-details");
    console.respond(&detail, serde_json::to_value(detail_fixture(Some((-21.165, -47.795)))).unwrap());
    console.respond(&detail, serde_json::to_value(detail_fixture(Some((-21.155, -47.805)))).unwrap());
    let system = system(&console, &RoutedTransport::default());

    let tracking = system
        .open_tracking(OrderId::from("o-2"), RecordingView::new())
        .await;
    assert_eq!(tracking.opened, RefreshOutcome::Initialized);
    {
        let session = tracking.session.lock().await;
        assert_eq!(session.view().markers().len(), 4);
        assert_eq!(session.view().routes().len(), 1);
        assert_eq!(session.view().fit_count(), 1);
    }

    sleep(Duration::from_millis(10_500)).await;
    {
        let session = tracking.session.lock().await;
        let courier = session.view().courier_marker().unwrap();
        assert_eq!((courier.position.lat, courier.position.lng), (-21.155, -47.805));
        assert_eq!(session.view().fit_count(), 1);
        assert_eq!(session.health(), ConnectionHealth::Connected);
    }

    let session = Arc::clone(&tracking.session);
    tracking.close().await;
    assert!(session.lock().await.view().is_released());

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_run_dispatch_posts_and_parses_summary() {
    let console = RoutedTransport::default();
    console.respond(
        &format!("{API}/dispatch/run"),
        json!({ "batches_created": 2, "orders_assigned": 5, "message": "ok" }),
    );
    let system = system(&console, &RoutedTransport::default());

    let summary = system.run_dispatch().await.unwrap();

    assert_eq!(summary.batches_created, 2);
    assert_eq!(summary.orders_assigned, 5);
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_run_dispatch_failure_surfaces() {
    let console = RoutedTransport::default();
    console.fail(&format!("{API}/dispatch/run"), 500);
    let system = system(&console, &RoutedTransport::default());

    assert!(system.run_dispatch().await.is_err());
    system.shutdown().await.unwrap();
}
