//! Maps `forge_controller::Error` onto HTTP status codes (§6 Control API).
//! Grounded on `nvisy_server::handler::error`'s kind-drives-status-code
//! shape, simplified to the one error source this surface actually has —
//! there is no auth/db/webhook layer here (§1 Out of scope).

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use forge_core::error::{Classify, ErrorClass};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Controller(#[from] forge_controller::Error),

    #[error("job {0} not found")]
    JobNotFound(uuid::Uuid),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::JobNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Controller(error) => match error.classify() {
                ErrorClass::FatalToJob => StatusCode::UNPROCESSABLE_ENTITY,
                ErrorClass::Configuration => StatusCode::BAD_REQUEST,
                ErrorClass::System => StatusCode::SERVICE_UNAVAILABLE,
                ErrorClass::Transient | ErrorClass::WorkerLocal => StatusCode::SERVICE_UNAVAILABLE,
            },
        };

        if status.is_server_error() {
            tracing::error!(target: "forge_server::error", error = %self, "request failed");
        } else {
            tracing::debug!(target: "forge_server::error", error = %self, "request rejected");
        }

        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}
