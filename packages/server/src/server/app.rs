//! Application setup and router configuration.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::kernel::jobs::JobQueue;
use crate::kernel::ServerDeps;
use crate::server::routes::{
    health_handler, job_status_handler, submissions_handler, webhook_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: Arc<ServerDeps>,
    pub queue: Arc<dyn JobQueue>,
}

/// Build the axum application.
pub fn build_app(deps: Arc<ServerDeps>, queue: Arc<dyn JobQueue>) -> Router {
    let state = AppState { deps, queue };

    Router::new()
        .route("/health", get(health_handler))
        .route("/telegram/webhook", post(webhook_handler))
        .route("/api/jobs/:id", get(job_status_handler))
        .route("/api/submissions", get(submissions_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
