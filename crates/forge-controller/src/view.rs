//! Read-only projections returned by the public contract (§4.8 `Status`,
//! `Scale`), kept separate from the persisted `Job`/`Worker` records so the
//! internal schema can evolve without changing the public surface (the
//! same split `nvisy-postgres`'s model/response layers draw).

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use forge_core::job::{Job, JobState, Lane};

/// The public view of one job's progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobView {
    pub job_id: Uuid,
    pub tenant_id: Uuid,
    pub lane: Lane,
    pub state: JobState,
    pub attempts: u32,
    pub submitted_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
    pub last_error: Option<String>,
}

impl JobView {
    pub fn from_job(job: &Job) -> Self {
        Self {
            job_id: job.job_id,
            tenant_id: job.tenant_id,
            lane: job.lane,
            state: job.state,
            attempts: job.attempts,
            submitted_at: job.submitted_at,
            started_at: job.started_at,
            finished_at: job.finished_at,
            last_error: job.last_error.clone(),
        }
    }
}

/// Per-lane worker and queue counts (§4.8 `GET cluster`).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LaneView {
    pub lane: Lane,
    pub workers: u32,
    pub idle: u32,
    pub processing: u32,
    pub waiting: u32,
    pub running: u32,
}

/// The full cluster status snapshot (§4.8 `GET cluster`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterView {
    pub lanes: Vec<LaneView>,
    pub resource_mem_utilization: f64,
    pub resource_concurrency_utilization: f64,
    pub paused: bool,
    pub shutting_down: bool,
}
