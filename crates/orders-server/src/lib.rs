pub mod error;
pub mod hub;
pub mod monitor;
pub mod routes;
pub mod state;

use axum::routing::get;
use axum::Router;
use orders_core::config::Config;
use orders_core::fetch::HttpSnapshotFetcher;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::hub::OrderHub;
use crate::monitor::OrderMonitor;
use crate::state::AppState;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve_on()` and available for integration testing.
pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Events (SSE)
        .route("/api/sse/orders", get(routes::events::sse_orders))
        // Snapshot
        .route("/api/orders", get(routes::orders::get_orders))
        .route("/api/orders/summary", get(routes::orders::get_summary))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Aborts the poll loop when the server future finishes or is dropped.
struct MonitorGuard(tokio::task::JoinHandle<()>);

impl Drop for MonitorGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Start the order feed: bind `0.0.0.0:{config.server.port}`, spawn the
/// poll loop and serve until the future is dropped.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(config, listener).await
}

/// Like `serve`, but on a pre-bound listener so the caller can read the
/// actual port first (useful when the port is 0).
pub async fn serve_on(config: Config, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
    config.validate()?;
    let actual_port = listener.local_addr()?.port();

    let hub = Arc::new(OrderHub::new());
    let fetcher = HttpSnapshotFetcher::new(&config.upstream)?;
    let _monitor = MonitorGuard(
        OrderMonitor::new(fetcher, hub.clone(), config.poll.interval()).spawn(),
    );

    let app = build_router(AppState::new(hub));

    tracing::info!(
        upstream = %config.upstream.base_url,
        interval_ms = config.poll.interval_ms,
        "order feed listening on http://localhost:{actual_port}"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
