//! In-memory `Store` double (mirrors `nvisy_test::mock`'s role for
//! `nvisy-core`'s provider traits, applied to `forge_core::Store`).

use std::collections::HashMap;

use forge_core::error::Result;
use forge_core::job::{Job, JobState};
use forge_core::store::{JobUpdate, QueueStat, Store, WorkerMetric};
use jiff::Timestamp;
use parking_lot::Mutex;
use uuid::Uuid;

/// A `Store` backed by an in-process `HashMap`, for unit and integration
/// tests that don't need a real Postgres instance.
#[derive(Default)]
pub struct InMemoryStore {
    jobs: Mutex<HashMap<Uuid, Job>>,
    worker_metrics: Mutex<Vec<WorkerMetric>>,
    queue_stats: Mutex<Vec<QueueStat>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test helper: total count of worker metrics appended so far.
    pub fn worker_metric_count(&self) -> usize {
        self.worker_metrics.lock().len()
    }

    /// Test helper: total count of queue stat samples appended so far.
    pub fn queue_stat_count(&self) -> usize {
        self.queue_stats.lock().len()
    }
}

#[async_trait::async_trait]
impl Store for InMemoryStore {
    async fn insert_job(&self, job: &Job) -> Result<()> {
        self.jobs.lock().insert(job.job_id, job.clone());
        Ok(())
    }

    async fn update_job(&self, job_id: Uuid, update: JobUpdate) -> Result<()> {
        let mut jobs = self.jobs.lock();
        let job = jobs
            .get_mut(&job_id)
            .ok_or_else(|| forge_core::error::Error::job_not_found(job_id))?;

        if let Some(state) = update.state {
            job.state = state;
        }
        if let Some(attempts) = update.attempts {
            job.attempts = attempts;
        }
        if let Some(worker_id) = update.worker_id {
            job.worker_id = worker_id;
        }
        if let Some(started_at) = update.started_at {
            job.started_at = started_at;
        }
        if let Some(finished_at) = update.finished_at {
            job.finished_at = finished_at;
        }
        if let Some(last_heartbeat) = update.last_heartbeat {
            job.last_heartbeat = last_heartbeat;
        }
        if let Some(last_error) = update.last_error {
            job.last_error = last_error;
        }
        if let Some(submitted_at) = update.submitted_at {
            job.submitted_at = submitted_at;
        }
        Ok(())
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>> {
        Ok(self.jobs.lock().get(&job_id).cloned())
    }

    async fn list_recoverable(&self, threshold: Timestamp) -> Result<Vec<Job>> {
        let jobs = self.jobs.lock();
        Ok(jobs
            .values()
            .filter(|job| {
                matches!(job.state, JobState::Running | JobState::LostWorker)
                    && job.last_heartbeat.map(|hb| hb < threshold).unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    async fn list_queued(&self) -> Result<Vec<Job>> {
        let jobs = self.jobs.lock();
        Ok(jobs
            .values()
            .filter(|job| job.state == JobState::Queued)
            .cloned()
            .collect())
    }

    async fn append_worker_metric(&self, metric: WorkerMetric) -> Result<()> {
        self.worker_metrics.lock().push(metric);
        Ok(())
    }

    async fn append_queue_stat(&self, stat: QueueStat) -> Result<()> {
        self.queue_stats.lock().push(stat);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_core::job::TenantPlan;

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let store = InMemoryStore::new();
        let job = Job::submit(
            Uuid::new_v4(),
            "ref",
            1_000,
            TenantPlan::Free,
            Timestamp::now(),
            50_000_000,
            forge_core::job::DEFAULT_MAX_ATTEMPTS,
        );
        store.insert_job(&job).await.unwrap();
        let fetched = store.get_job(job.job_id).await.unwrap().unwrap();
        assert_eq!(fetched.job_id, job.job_id);
    }

    #[tokio::test]
    async fn list_queued_only_returns_queued_jobs() {
        let store = InMemoryStore::new();
        let queued = Job::submit(
            Uuid::new_v4(),
            "ref",
            1_000,
            TenantPlan::Free,
            Timestamp::now(),
            50_000_000,
            forge_core::job::DEFAULT_MAX_ATTEMPTS,
        );
        let mut running = Job::submit(
            Uuid::new_v4(),
            "ref",
            1_000,
            TenantPlan::Free,
            Timestamp::now(),
            50_000_000,
            forge_core::job::DEFAULT_MAX_ATTEMPTS,
        );
        running.mark_running(Uuid::new_v4(), Timestamp::now());

        store.insert_job(&queued).await.unwrap();
        store.insert_job(&running).await.unwrap();

        let result = store.list_queued().await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].job_id, queued.job_id);
    }
}
