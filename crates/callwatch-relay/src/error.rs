use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Which relay endpoint failed; picks the fixed `error` text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Activity,
    Sessions,
}

impl Resource {
    pub fn failure_text(self) -> &'static str {
        match self {
            Self::Activity => "Failed to fetch activity data",
            Self::Sessions => "Failed to fetch sessions data",
        }
    }
}

/// Failure talking to the backend.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Backend API error: {0}")]
    Status(StatusCode),
    #[error("backend returned an unreadable body: {0}")]
    Decode(String),
    #[error("backend API key is not configured")]
    MissingCredential,
}

impl UpstreamError {
    fn backend_status(&self) -> Option<u16> {
        match self {
            Self::Status(status) => Some(status.as_u16()),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{}: {source}", .resource.failure_text())]
    Upstream {
        resource: Resource,
        source: UpstreamError,
    },
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    backend_status: Option<u16>,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    success: false,
                    error: "Invalid request",
                    message,
                    backend_status: None,
                },
            ),
            Self::Upstream { resource, source } => {
                tracing::warn!(error = %source, "{}", resource.failure_text());
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        success: false,
                        error: resource.failure_text(),
                        backend_status: source.backend_status(),
                        message: source.to_string(),
                    },
                )
            },
        };
        (status, Json(body)).into_response()
    }
}
