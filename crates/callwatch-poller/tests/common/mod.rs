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

use callwatch_poller::PollerConfig;

/// Canned reply for one endpoint.
#[derive(Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
}

impl Reply {
    pub fn activities(activities: Vec<Value>) -> Self {
        Self {
            status: StatusCode::OK,
            body: json!({ "success": true, "activities": activities }),
        }
    }

    pub fn sessions(sessions: Vec<Value>) -> Self {
        Self {
            status: StatusCode::OK,
            body: json!({ "success": true, "sessions": sessions }),
        }
    }

    pub fn server_error(error: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: json!({ "success": false, "error": error, "message": "upstream unavailable" }),
        }
    }
}

#[derive(Default)]
struct Scripted {
    activity: Option<Reply>,
    sessions: Option<Reply>,
    activity_queries: Vec<HashMap<String, String>>,
    session_hits: usize,
}

type Shared = Arc<Mutex<Scripted>>;

/// Stand-in for the relay with replies the test can swap at any time.
pub struct FakeRelay {
    pub addr: SocketAddr,
    shared: Shared,
    _handle: tokio::task::JoinHandle<()>,
}

impl FakeRelay {
    pub async fn start() -> Self {
        let shared: Shared = Arc::new(Mutex::new(Scripted::default()));
        let app = Router::new()
            .route("/api/activity", get(activity))
            .route("/api/sessions", get(sessions))
            .with_state(Arc::clone(&shared));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        Self {
            addr,
            shared,
            _handle: handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Poller config pointed at this relay with short intervals.
    pub fn config(&self) -> PollerConfig {
        PollerConfig {
            base_url: self.base_url(),
            activity_interval_ms: 40,
            session_interval_secs: 1,
            request_timeout_secs: 2,
            ..PollerConfig::default()
        }
    }

    pub fn set_activity(&self, reply: Reply) {
        self.shared.lock().unwrap().activity = Some(reply);
    }

    pub fn set_sessions(&self, reply: Reply) {
        self.shared.lock().unwrap().sessions = Some(reply);
    }

    pub fn activity_queries(&self) -> Vec<HashMap<String, String>> {
        self.shared.lock().unwrap().activity_queries.clone()
    }

    pub fn session_hits(&self) -> usize {
        self.shared.lock().unwrap().session_hits
    }
}

async fn activity(
    State(shared): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let mut guard = shared.lock().unwrap();
    guard.activity_queries.push(params);
    respond(guard.activity.clone())
}

async fn sessions(State(shared): State<Shared>) -> Response {
    let mut guard = shared.lock().unwrap();
    guard.session_hits += 1;
    respond(guard.sessions.clone())
}

fn respond(reply: Option<Reply>) -> Response {
    match reply {
        Some(reply) => (reply.status, Json(reply.body)).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Wait until `pred` holds for the watched value or panic after two seconds.
pub async fn wait_until<T, F>(rx: &mut tokio::sync::watch::Receiver<T>, pred: F) -> T
where
    T: Clone,
    F: FnMut(&T) -> bool,
{
    tokio::time::timeout(Duration::from_secs(2), rx.wait_for(pred))
        .await
        .expect("condition not reached in time")
        .expect("poller stopped")
        .clone()
}
