// UI routes live next to whatever else the host router serves; run_server is the
// standalone host used by the binary.
pub mod assets;
pub mod handlers;
pub mod range;
pub mod routes;
pub mod security;
pub mod state;
pub mod static_files;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::{AppConfig, WebConfig};

pub use routes::setup_ui_routes;

/// The standalone router: the UI (when enabled) plus request tracing and compression.
pub fn build_app(config: &AppConfig) -> Router {
    setup_ui_routes(config, Router::new())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(web: WebConfig, app: Router) -> std::io::Result<()> {
    let addr = format!("{}:{}", web.host, web.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
