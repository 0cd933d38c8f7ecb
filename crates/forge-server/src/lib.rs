#![forbid(unsafe_code)]

//! The Control API surface (§6): four HTTP endpoints over the Cluster
//! Controller. Transport only — authentication, file upload, and export
//! formatting are out of scope (§1).

mod error;
mod handler;
mod middleware;
mod routes;
mod state;

pub use error::ApiError;
pub use handler::{LaneTarget, ScaleAck, ScaleRequest, SubmitRequest, SubmitResponse};
pub use routes::router;
pub use state::ServerState;
