use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub backend_url: String,
    pub credential_configured: bool,
}

/// GET /health. Does not contact the backend.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        backend_url: state.config.backend_base().to_string(),
        credential_configured: state.backend.has_credential(),
    })
}
