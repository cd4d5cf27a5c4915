//! Axum HTTP server for the REST API

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::service::GovernorService;
use crate::{Error, Result};

use super::handlers;

/// Metrics endpoint handler
#[cfg(feature = "metrics")]
async fn metrics_handler() -> String {
    crate::metrics::encode()
}

/// Router with every governor endpoint
pub fn router(service: Arc<GovernorService>) -> Router {
    let app = Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/governor/limit", get(handlers::governor_limits))
        .route(
            "/api/v1/governor/notional/limit/detail",
            get(handlers::notional_limit_details),
        )
        .route(
            "/api/v1/governor/notional/limit/{chain}",
            get(handlers::notional_limit_by_chain),
        )
        .route(
            "/api/v1/governor/notional/available",
            get(handlers::notional_available),
        )
        .route(
            "/api/v1/governor/notional/max_available/{chain}",
            get(handlers::max_available_notional),
        )
        .route(
            "/api/v1/governor/available_notional_by_chain",
            get(handlers::available_notional_by_chain),
        )
        .route("/api/v1/governor/enqueued_vaas", get(handlers::enqueued_vaas))
        .route(
            "/api/v1/governor/is_vaa_enqueued/{chain}/{emitter}/{seq}",
            get(handlers::is_vaa_enqueued),
        );

    #[cfg(feature = "metrics")]
    let app = app.route("/metrics", get(metrics_handler));

    app.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(service)
}

/// Run the REST API server
pub async fn run_server(service: Arc<GovernorService>, addr: SocketAddr) -> Result<()> {
    let app = router(service);

    info!("REST API server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::ConfigError(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::ConfigError(format!("Server error: {}", e)))?;

    Ok(())
}
