use axum::extract::{Query, State};
use axum::response::Json;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{RelayError, Resource};
use crate::state::AppState;

/// Query string of `GET /api/activity`.
#[derive(Debug, Default, Deserialize)]
pub struct ActivityParams {
    pub run_id: Option<String>,
    /// Kept as text so a malformed value yields a structured 400.
    pub limit: Option<String>,
}

fn parse_limit(raw: Option<&str>, default: u32) -> Result<u32, RelayError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(default),
        Some(text) => match text.parse::<u32>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(RelayError::BadRequest(format!(
                "limit must be a positive integer, got `{text}`"
            ))),
        },
    }
}

/// GET /api/activity: recent activities, optionally for one run.
pub async fn get_activity(
    State(state): State<AppState>,
    Query(params): Query<ActivityParams>,
) -> Result<Json<Value>, RelayError> {
    let limit = parse_limit(params.limit.as_deref(), state.config.default_limit)?;
    let mut query = vec![("limit", limit.to_string())];
    if let Some(run_id) = params.run_id.filter(|r| !r.is_empty()) {
        query.push(("run_id", run_id));
    }
    let body = state
        .backend
        .get_json("/api/dashboard/activity", &query, false)
        .await
        .map_err(|source| RelayError::Upstream {
            resource: Resource::Activity,
            source,
        })?;
    Ok(Json(body))
}

/// GET /api/sessions: per-run summaries.
pub async fn get_sessions(State(state): State<AppState>) -> Result<Json<Value>, RelayError> {
    let body = state
        .backend
        .get_json("/api/dashboard/sessions", &[], true)
        .await
        .map_err(|source| RelayError::Upstream {
            resource: Resource::Sessions,
            source,
        })?;
    Ok(Json(body))
}
