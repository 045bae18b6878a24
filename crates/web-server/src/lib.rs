//! # Meridian Web Server
//!
//! A JSON API over the analytics engine: trigger a client analysis and read back the
//! insights persisted by earlier runs.

use axum::{
    routing::{get, post},
    Router,
};
use database::DbRepository;
use engine::AnalyticsOrchestrator;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
pub struct AppState {
    pub orchestrator: Arc<AnalyticsOrchestrator>,
    pub repository: DbRepository,
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any());

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/clients/:client_id/insights", get(handlers::get_client_insights))
        .route("/api/clients/:client_id/analyses", post(handlers::create_analysis))
        .with_state(state)
        .layer(cors)
        // Logs every incoming request.
        .layer(TraceLayer::new_for_http())
}

/// Serves the API on `addr` until the process is stopped.
pub async fn run_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Web server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
