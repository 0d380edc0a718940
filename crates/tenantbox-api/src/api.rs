//! Router and shared handler state.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Router, middleware};
use tenantbox_runtime::coordinator::Coordinator;

use crate::handlers;
use crate::middleware::trace_request;

/// Application state shared with handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Lifecycle coordinator every request goes through.
    pub coordinator: Arc<Coordinator>,
}

/// Creates the router with all endpoints.
#[must_use]
pub fn create_router(coordinator: Arc<Coordinator>) -> Router {
    Router::new()
        .route("/containers/start", post(handlers::start_container))
        .route("/containers/stop", post(handlers::stop_container))
        .route("/containers/exec", post(handlers::exec_container))
        .route(
            "/containers/{identity}/status",
            get(handlers::container_status),
        )
        .layer(middleware::from_fn(trace_request))
        .with_state(AppState { coordinator })
}
