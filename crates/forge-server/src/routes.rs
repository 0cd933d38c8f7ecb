//! Route table for the four Control API endpoints (§6).

use axum::Router;
use axum::routing::{get, post};

use crate::handler;
use crate::middleware::RouterObservabilityExt;
use crate::state::ServerState;

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/submit", post(handler::submit))
        .route("/status/{job_id}", get(handler::status))
        .route("/cluster", get(handler::cluster))
        .route("/scale", post(handler::scale))
        .with_state(state)
        .with_observability()
}
