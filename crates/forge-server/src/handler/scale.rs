//! `POST scale {target}` (§4.8 `Scale`, §6 Control API): a manual override
//! of the per-lane worker count, bounded by `[min_workers, max_workers]`.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use forge_core::job::Lane;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::ServerState;

#[derive(Debug, Deserialize)]
pub struct ScaleRequest {
    pub targets: Vec<LaneTarget>,
}

#[derive(Debug, Deserialize)]
pub struct LaneTarget {
    pub lane: Lane,
    pub target: u32,
}

#[derive(Debug, Serialize)]
pub struct ScaleAck {
    pub accepted: bool,
}

#[tracing::instrument(skip(state), target = "forge_server::handler::scale")]
pub async fn scale(
    State(state): State<ServerState>,
    Json(request): Json<ScaleRequest>,
) -> Result<(StatusCode, Json<ScaleAck>), ApiError> {
    let targets: Vec<(Lane, u32)> = request.targets.into_iter().map(|t| (t.lane, t.target)).collect();
    state.controller.scale(&targets).await?;
    Ok((StatusCode::ACCEPTED, Json(ScaleAck { accepted: true })))
}
