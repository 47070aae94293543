pub mod api;
pub mod config;
pub mod error;
pub mod health;
pub mod state;

use axum::Router;
use axum::http::HeaderValue;
use axum::http::header::CACHE_CONTROL;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use config::RelayConfig;
use state::AppState;

/// Build the Axum router and application state from a config.
pub fn build_app(config: RelayConfig) -> Result<(Router<()>, AppState), reqwest::Error> {
    let state = AppState::new(config)?;

    let app = Router::new()
        .route("/api/activity", get(api::get_activity))
        .route("/api/sessions", get(api::get_sessions))
        .route("/health", get(health::health_check))
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CorsLayer::permissive())
        .with_state(state.clone());

    Ok((app, state))
}
