//! `POST submit` (§6 Control API).

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use forge_core::job::TenantPlan;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::ServerState;

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub tenant_id: Uuid,
    pub file_ref: String,
    pub file_size_bytes: u64,
    pub tenant_plan: TenantPlan,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub job_id: Uuid,
}

#[tracing::instrument(skip_all, fields(tenant_id = %request.tenant_id), target = "forge_server::handler::submit")]
pub async fn submit(
    State(state): State<ServerState>,
    Json(request): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let job_id = state
        .controller
        .submit(request.tenant_id, request.file_ref, request.file_size_bytes, request.tenant_plan)
        .await?;

    Ok((StatusCode::ACCEPTED, Json(SubmitResponse { job_id })))
}
