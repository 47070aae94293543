use tracing_subscriber::EnvFilter;

use callwatch_relay::build_app;
use callwatch_relay::config::RelayConfig;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = RelayConfig::load();
    if let Err(e) = config.validate() {
        tracing::error!("Invalid configuration: {e}");
        std::process::exit(1);
    }
    let addr = config.listen_addr.clone();
    let backend = config.backend_base().to_string();

    let (app, _state) = match build_app(config) {
        Ok(built) => built,
        Err(e) => {
            tracing::error!("Failed to create backend client: {e}");
            std::process::exit(1);
        },
    };

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind to {addr}: {e}");
            std::process::exit(1);
        },
    };

    tracing::info!(%addr, %backend, "callwatch relay listening");

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Shutting down");
    };
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
    {
        tracing::error!("Relay server error: {e}");
        std::process::exit(1);
    }
}
