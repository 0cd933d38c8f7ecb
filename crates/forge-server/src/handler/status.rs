//! `GET status/{job_id}` (§6 Control API).

use axum::Json;
use axum::extract::{Path, State};
use forge_controller::JobView;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::ServerState;

#[tracing::instrument(skip(state), target = "forge_server::handler::status")]
pub async fn status(
    State(state): State<ServerState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobView>, ApiError> {
    let job = state.controller.status(job_id).await?;
    job.map(Json).ok_or(ApiError::JobNotFound(job_id))
}
