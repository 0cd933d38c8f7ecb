//! `GET cluster` (§6 Control API).

use axum::Json;
use axum::extract::State;
use forge_controller::ClusterView;

use crate::state::ServerState;

#[tracing::instrument(skip(state), target = "forge_server::handler::cluster")]
pub async fn cluster(State(state): State<ServerState>) -> Json<ClusterView> {
    Json(state.controller.cluster_view())
}
