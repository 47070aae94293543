use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde_json::Value;

use callwatch_relay::build_app;
use callwatch_relay::config::RelayConfig;

/// One request as the backend saw it.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub path: &'static str,
    pub query: HashMap<String, String>,
    pub api_key: Option<String>,
}

#[derive(Default)]
struct BackendScript {
    activity: Option<(StatusCode, String)>,
    sessions: Option<(StatusCode, String)>,
    seen: Vec<SeenRequest>,
}

type Shared = Arc<Mutex<BackendScript>>;

/// Stand-in for the call automation backend.
pub struct FakeBackend {
    pub addr: SocketAddr,
    shared: Shared,
    _handle: tokio::task::JoinHandle<()>,
}

impl FakeBackend {
    pub async fn start() -> Self {
        let shared: Shared = Arc::new(Mutex::new(BackendScript::default()));
        let app = Router::new()
            .route("/api/dashboard/activity", get(activity))
            .route("/api/dashboard/sessions", get(sessions))
            .with_state(Arc::clone(&shared));
        let (addr, handle) = serve(app).await;
        Self {
            addr,
            shared,
            _handle: handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn reply_activity(&self, status: StatusCode, body: &Value) {
        self.shared.lock().unwrap().activity = Some((status, body.to_string()));
    }

    pub fn reply_activity_raw(&self, status: StatusCode, body: &str) {
        self.shared.lock().unwrap().activity = Some((status, body.to_string()));
    }

    pub fn reply_sessions(&self, status: StatusCode, body: &Value) {
        self.shared.lock().unwrap().sessions = Some((status, body.to_string()));
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.shared.lock().unwrap().seen.clone()
    }
}

async fn activity(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    record_and_reply(&shared, "/api/dashboard/activity", &headers, query, |s| {
        s.activity.clone()
    })
}

async fn sessions(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    record_and_reply(&shared, "/api/dashboard/sessions", &headers, query, |s| {
        s.sessions.clone()
    })
}

fn record_and_reply(
    shared: &Shared,
    path: &'static str,
    headers: &HeaderMap,
    query: HashMap<String, String>,
    pick: impl Fn(&BackendScript) -> Option<(StatusCode, String)>,
) -> Response {
    let mut guard = shared.lock().unwrap();
    guard.seen.push(SeenRequest {
        path,
        query,
        api_key: headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });
    match pick(&guard) {
        Some((status, body)) => (
            status,
            [("content-type", "application/json")],
            body,
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, Json(serde_json::json!({}))).into_response(),
    }
}

/// The relay under test, pointed at a [`FakeBackend`].
pub struct TestRelay {
    pub addr: SocketAddr,
    _handle: tokio::task::JoinHandle<()>,
}

impl TestRelay {
    pub async fn new(backend: &FakeBackend, api_key: Option<&str>) -> Self {
        let config = RelayConfig {
            listen_addr: "127.0.0.1:0".to_string(),
            backend_url: backend.base_url(),
            backend_api_key: api_key.map(str::to_string),
            request_timeout_secs: 2,
            ..RelayConfig::default()
        };
        Self::from_config(config).await
    }

    pub async fn from_config(config: RelayConfig) -> Self {
        let (app, _state) = build_app(config).unwrap();
        let (addr, handle) = serve(app).await;
        Self {
            addr,
            _handle: handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

async fn serve(app: Router) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    // Give the server a moment to start accepting
    tokio::time::sleep(Duration::from_millis(20)).await;
    (addr, handle)
}
