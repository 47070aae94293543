use reqwest::StatusCode;
use reqwest::header::{CACHE_CONTROL, HeaderMap, HeaderValue, PRAGMA};
use serde::de::DeserializeOwned;
use serde_json::Value;

use callwatch_core::events::ActivityRecord;
use callwatch_core::session::SessionSummary;

use crate::config::{DEFAULT_ACTIVITY_LIMIT, PollerConfig};

/// Why a fetch against the relay did not produce data.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP error {status}: {detail}")]
    Status { status: StatusCode, detail: String },
    #[error("{0}")]
    Rejected(String),
    #[error("malformed response: {0}")]
    Decode(String),
}

/// Parameters of one activity request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityQuery {
    /// Restrict to one run; `None` asks for the most recent activity of all runs.
    pub run_id: Option<String>,
    pub limit: u32,
}

impl ActivityQuery {
    pub fn new(run_id: Option<String>, limit: u32) -> Self {
        Self { run_id, limit }
    }
}

impl Default for ActivityQuery {
    fn default() -> Self {
        Self::new(None, DEFAULT_ACTIVITY_LIMIT)
    }
}

/// HTTP client for the relay's activity and session endpoints.
#[derive(Debug, Clone)]
pub struct DashboardClient {
    http: reqwest::Client,
    base_url: String,
}

impl DashboardClient {
    pub fn new(config: &PollerConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        let http = reqwest::Client::builder()
            .user_agent(concat!("callwatch/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /api/activity`, newest first.
    pub async fn fetch_activities(
        &self,
        query: &ActivityQuery,
    ) -> Result<Vec<ActivityRecord>, FetchError> {
        let mut params = vec![("limit", query.limit.to_string())];
        if let Some(run_id) = &query.run_id {
            params.push(("run_id", run_id.clone()));
        }
        let resp = self
            .http
            .get(format!("{}/api/activity", self.base_url))
            .query(&params)
            .send()
            .await?;
        read_envelope(resp, "activities", "Failed to fetch activities").await
    }

    /// `GET /api/sessions`.
    pub async fn fetch_sessions(&self) -> Result<Vec<SessionSummary>, FetchError> {
        let resp = self
            .http
            .get(format!("{}/api/sessions", self.base_url))
            .send()
            .await?;
        read_envelope(resp, "sessions", "Failed to fetch sessions").await
    }
}

async fn read_envelope<T: DeserializeOwned>(
    resp: reqwest::Response,
    field: &str,
    fallback: &str,
) -> Result<T, FetchError> {
    let status = resp.status();
    let body = resp.bytes().await?;
    if !status.is_success() {
        let detail = serde_json::from_slice::<Value>(&body)
            .ok()
            .and_then(|v| first_text(&v, &["message", "error"]))
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
        return Err(FetchError::Status { status, detail });
    }
    decode_envelope(&body, field, fallback)
}

/// Unwrap `{success, <field>, error?, message?}`.
///
/// `success` other than `true` is a rejection; a missing or mistyped
/// `field` is a decode failure.
pub(crate) fn decode_envelope<T: DeserializeOwned>(
    body: &[u8],
    field: &str,
    fallback: &str,
) -> Result<T, FetchError> {
    let mut envelope: Value =
        serde_json::from_slice(body).map_err(|e| FetchError::Decode(e.to_string()))?;
    if envelope.get("success").and_then(Value::as_bool) != Some(true) {
        let reason = first_text(&envelope, &["error", "message"])
            .unwrap_or_else(|| fallback.to_string());
        return Err(FetchError::Rejected(reason));
    }
    let payload = envelope
        .get_mut(field)
        .map(Value::take)
        .ok_or_else(|| FetchError::Decode(format!("missing `{field}`")))?;
    serde_json::from_value(payload).map_err(|e| FetchError::Decode(format!("`{field}`: {e}")))
}

/// First non-empty string among `keys`. A rejected envelope leads with
/// `error`; an HTTP error body leads with the more specific `message`.
fn first_text(envelope: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| envelope.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode_activities(body: Value) -> Result<Vec<ActivityRecord>, FetchError> {
        decode_envelope(body.to_string().as_bytes(), "activities", "Failed to fetch activities")
    }

    #[test]
    fn decodes_successful_envelope() {
        let activities = decode_activities(json!({
            "success": true,
            "activities": [{
                "id": "a1",
                "run_id": "run-1",
                "event_type": "CALL_ENDED",
                "data": {},
                "timestamp": "2025-03-01T12:00:00Z"
            }]
        }))
        .unwrap();
        assert_eq!(activities.len(), 1);
        assert!(activities[0].is_call_ended());
    }

    #[test]
    fn unsuccessful_envelope_prefers_error_over_message() {
        let err = decode_activities(json!({
            "success": false,
            "error": "Failed to fetch activity data",
            "message": "backend unreachable"
        }))
        .unwrap_err();
        assert!(matches!(&err, FetchError::Rejected(m) if m == "Failed to fetch activity data"));
    }

    #[test]
    fn unsuccessful_envelope_falls_back_to_message() {
        let err = decode_activities(json!({
            "success": false,
            "error": "",
            "message": "backend unreachable"
        }))
        .unwrap_err();
        assert!(matches!(&err, FetchError::Rejected(m) if m == "backend unreachable"));
    }

    #[test]
    fn missing_success_is_rejected_with_fallback() {
        let err = decode_activities(json!({ "activities": [] })).unwrap_err();
        assert!(matches!(&err, FetchError::Rejected(m) if m == "Failed to fetch activities"));
    }

    #[test]
    fn missing_field_is_decode_error() {
        let err = decode_activities(json!({ "success": true })).unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn bad_record_fails_the_whole_response() {
        let err = decode_activities(json!({
            "success": true,
            "activities": [{ "id": "a1", "run_id": "r", "event_type": "X", "timestamp": "nope" }]
        }))
        .unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn garbage_body_is_decode_error() {
        let err = decode_envelope::<Vec<SessionSummary>>(b"<html>", "sessions", "x").unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn trailing_slash_trimmed() {
        let config = PollerConfig {
            base_url: "http://localhost:3000/".into(),
            ..PollerConfig::default()
        };
        let client = DashboardClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
    }
}
