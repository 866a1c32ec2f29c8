//! HTTP surface for the function host's custom handler.
//!
//! ```text
//! GET       /            root
//! GET       /api         root
//! GET       /api/config  redacted settings
//! GET|POST  /api/health  health status
//! ```

mod handlers;
mod redact;

pub use handlers::{AppState, HealthStatus};
pub use redact::{RedactedDatabase, RedactedExternalApi, RedactedSecurity, RedactedSettings};

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Environment variable the function host sets to the handler port.
pub const PORT_ENV: &str = "FUNCTIONS_CUSTOMHANDLER_PORT";

/// Port used when the host does not set one.
pub const DEFAULT_PORT: u16 = 3000;

/// Build the router over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/api", get(handlers::root))
        .route("/api/config", get(handlers::config))
        .route("/api/health", get(handlers::health).post(handlers::health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serve until Ctrl+C.
///
/// # Errors
///
/// Returns any IO error from the listener.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "HTTP server starting");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C; serving until killed");
            std::future::pending::<()>().await;
        }
    }
}
