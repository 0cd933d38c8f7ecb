//! Job Store external collaborator (component C3, §6).
//!
//! `forge-postgres` is the concrete backend; `forge-test` supplies an
//! in-memory implementation for unit tests. Every operation must be
//! transactional at the single-row level (§6).

use jiff::Timestamp;
use uuid::Uuid;

use crate::error::Result;
use crate::job::{Job, JobState, Lane};
use crate::worker::WorkerStatus;

/// A partial update to a job row. Every field left `None` is left
/// unmodified; this lets `UpdateJob(fields...)` touch only the columns a
/// given transition needs, instead of rewriting the whole row.
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub state: Option<JobState>,
    pub attempts: Option<u32>,
    pub worker_id: Option<Option<Uuid>>,
    pub started_at: Option<Option<Timestamp>>,
    pub finished_at: Option<Option<Timestamp>>,
    pub last_heartbeat: Option<Option<Timestamp>>,
    pub last_error: Option<Option<String>>,
    pub submitted_at: Option<Timestamp>,
    pub result_ref: Option<Option<String>>,
}

impl JobUpdate {
    pub fn from_job(job: &Job, result_ref: Option<String>) -> Self {
        Self {
            state: Some(job.state),
            attempts: Some(job.attempts),
            worker_id: Some(job.worker_id),
            started_at: Some(job.started_at),
            finished_at: Some(job.finished_at),
            last_heartbeat: Some(job.last_heartbeat),
            last_error: Some(job.last_error.clone()),
            submitted_at: Some(job.submitted_at),
            result_ref: result_ref.map(Some),
        }
    }
}

/// A single worker health/throughput sample, appended for observability
/// and queried back by the health monitor (§6 `workers` table).
#[derive(Debug, Clone)]
pub struct WorkerMetric {
    pub worker_id: Uuid,
    pub lane: Lane,
    pub status: WorkerStatus,
    pub recorded_at: Timestamp,
    pub mem_used_bytes: u64,
}

/// A single queue-depth sample for a lane, appended periodically
/// (§6 `queue_stats` table).
#[derive(Debug, Clone)]
pub struct QueueStat {
    pub lane: Lane,
    pub ts: Timestamp,
    pub waiting: u32,
    pub running: u32,
    pub completed: u32,
    pub failed: u32,
}

/// Durable record of every submitted job and its terminal state.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    async fn insert_job(&self, job: &Job) -> Result<()>;

    async fn update_job(&self, job_id: Uuid, update: JobUpdate) -> Result<()>;

    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>>;

    /// Jobs in `Running` or `LostWorker` whose `last_heartbeat` is older
    /// than `threshold`, the candidate set for recovery (§4.5).
    async fn list_recoverable(&self, threshold: Timestamp) -> Result<Vec<Job>>;

    /// Every job currently `Queued`, used to rebuild lanes after a
    /// control-plane restart (§4.1 Durability).
    async fn list_queued(&self) -> Result<Vec<Job>>;

    async fn append_worker_metric(&self, metric: WorkerMetric) -> Result<()>;

    async fn append_queue_stat(&self, stat: QueueStat) -> Result<()>;
}
