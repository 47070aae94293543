use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde_json::{Value, json};

use callwatch_dashboard::config::DashboardConfig;
use callwatch_relay::build_app;
use callwatch_relay::config::RelayConfig;

#[derive(Default)]
struct Script {
    activity: Option<(StatusCode, Value)>,
    sessions: Option<(StatusCode, Value)>,
    activity_queries: Vec<HashMap<String, String>>,
}

type Shared = Arc<Mutex<Script>>;

/// A call automation backend with a real relay in front of it.
pub struct Stack {
    pub relay_addr: SocketAddr,
    shared: Shared,
    _handles: Vec<tokio::task::JoinHandle<()>>,
}

impl Stack {
    pub async fn start() -> Self {
        let shared: Shared = Arc::new(Mutex::new(Script::default()));
        let backend = Router::new()
            .route("/api/dashboard/activity", get(activity))
            .route("/api/dashboard/sessions", get(sessions))
            .with_state(Arc::clone(&shared));
        let (backend_addr, backend_handle) = serve(backend).await;

        let config = RelayConfig {
            listen_addr: "127.0.0.1:0".to_string(),
            backend_url: format!("http://{backend_addr}"),
            backend_api_key: Some("test-key".to_string()),
            request_timeout_secs: 2,
            ..RelayConfig::default()
        };
        let (relay, _state) = build_app(config).unwrap();
        let (relay_addr, relay_handle) = serve(relay).await;

        Self {
            relay_addr,
            shared,
            _handles: vec![backend_handle, relay_handle],
        }
    }

    /// Dashboard config pointed at the relay with short poll intervals.
    pub fn dashboard_config(&self) -> DashboardConfig {
        DashboardConfig {
            relay_url: format!("http://{}", self.relay_addr),
            activity_interval_ms: 40,
            session_interval_secs: 1,
            request_timeout_secs: 2,
            ..DashboardConfig::default()
        }
    }

    pub fn activities(&self, activities: Vec<Value>) {
        self.shared.lock().unwrap().activity = Some((
            StatusCode::OK,
            json!({ "success": true, "activities": activities }),
        ));
    }

    pub fn activity_outage(&self) {
        self.shared.lock().unwrap().activity = Some((
            StatusCode::SERVICE_UNAVAILABLE,
            json!({ "detail": "maintenance" }),
        ));
    }

    pub fn sessions(&self, sessions: Vec<Value>) {
        self.shared.lock().unwrap().sessions = Some((
            StatusCode::OK,
            json!({ "success": true, "sessions": sessions }),
        ));
    }

    pub fn activity_queries(&self) -> Vec<HashMap<String, String>> {
        self.shared.lock().unwrap().activity_queries.clone()
    }
}

async fn activity(
    State(shared): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let mut guard = shared.lock().unwrap();
    guard.activity_queries.push(query);
    respond(guard.activity.clone())
}

async fn sessions(State(shared): State<Shared>) -> Response {
    respond(shared.lock().unwrap().sessions.clone())
}

fn respond(reply: Option<(StatusCode, Value)>) -> Response {
    match reply {
        Some((status, body)) => (status, Json(body)).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn serve(app: Router) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    (addr, handle)
}

/// Wait until `pred` holds for the watched value or panic after three seconds.
pub async fn wait_until<T, F>(rx: &mut tokio::sync::watch::Receiver<T>, pred: F) -> T
where
    T: Clone,
    F: FnMut(&T) -> bool,
{
    tokio::time::timeout(Duration::from_secs(3), rx.wait_for(pred))
        .await
        .expect("condition not reached in time")
        .expect("poller stopped")
        .clone()
}
