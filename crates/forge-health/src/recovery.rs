//! Lost-job recovery (§4.5).
//!
//! Runs on the same cadence as the health monitor, immediately after
//! worker liveness evaluation: a job's own heartbeat — not just its
//! worker's — decides whether it needs to come back onto a lane.

use std::sync::Arc;

use forge_core::clock::Clock;
use forge_core::job::JobState;
use forge_core::store::{JobUpdate, Store};
use forge_queue::PriorityQueueManager;

use crate::config::HealthConfig;
use crate::error::{Error, Result};

const TRACING_TARGET_RECOVERY: &str = "forge_health::recovery";

/// Tally of one recovery pass, useful for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoverySummary {
    pub requeued: u32,
    pub failed_permanently: u32,
}

/// Scans the store for `Running`/`LostWorker` jobs whose heartbeat is
/// older than `recovery_threshold`, and either requeues them (attempts
/// remaining) or marks them `Failed` (attempts exhausted) — §4.5.
///
/// The recovered job's `priority_key` is preserved and `submitted_at` is
/// refreshed to the recovery time, so it competes fairly with jobs
/// submitted after the outage rather than jumping the entire queue
/// (Design Notes open question 1).
#[tracing::instrument(skip(store, pqm, clock, config), target = "forge_health::recovery")]
pub async fn recover_lost_jobs(
    store: &Arc<dyn Store>,
    pqm: &PriorityQueueManager,
    clock: &Arc<dyn Clock>,
    config: &HealthConfig,
) -> Result<RecoverySummary> {
    let now = clock.now();
    let threshold = now - config.recovery_threshold();
    let candidates = store.list_recoverable(threshold).await.map_err(Error::Store)?;

    let mut summary = RecoverySummary::default();
    for mut job in candidates {
        let job_id = job.job_id;
        let lane = job.lane;
        job.mark_lost_worker(now, "worker heartbeat expired");

        let recovered = pqm.requeue(job, now, true);
        if recovered.state == JobState::Failed {
            summary.failed_permanently += 1;
            tracing::warn!(
                target: TRACING_TARGET_RECOVERY,
                %job_id,
                %lane,
                "job exhausted retries during recovery, marking failed"
            );
        } else {
            summary.requeued += 1;
            tracing::info!(
                target: TRACING_TARGET_RECOVERY,
                %job_id,
                %lane,
                attempts = recovered.attempts,
                "recovered lost job back onto its lane"
            );
        }

        store
            .update_job(job_id, JobUpdate::from_job(&recovered, None))
            .await
            .map_err(Error::Store)?;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_core::job::{Job, TenantPlan};
    use forge_queue::LaneCaps;
    use forge_test::clock::FakeClock;
    use forge_test::store::InMemoryStore;
    use uuid::Uuid;

    fn running_job(now: jiff::Timestamp, heartbeat: jiff::Timestamp, attempts: u32) -> Job {
        let mut job = Job::submit(
            Uuid::new_v4(),
            "s3://bucket/key",
            1_000,
            TenantPlan::Free,
            now,
            50_000_000,
            forge_core::job::DEFAULT_MAX_ATTEMPTS,
        );
        job.attempts = attempts;
        job.mark_running(Uuid::new_v4(), now);
        job.last_heartbeat = Some(heartbeat);
        job
    }

    #[tokio::test]
    async fn stale_heartbeat_requeues_the_job() {
        let now = jiff::Timestamp::now();
        let stale = now - jiff::SignedDuration::from_secs(200);
        let job = running_job(stale, stale, 0);
        let job_id = job.job_id;

        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        store.insert_job(&job).await.unwrap();

        let pqm = PriorityQueueManager::new(store.clone(), LaneCaps::default());
        let clock: Arc<dyn Clock> = Arc::new(FakeClock::new(now));
        let config = HealthConfig::default();

        let summary = recover_lost_jobs(&store, &pqm, &clock, &config).await.unwrap();
        assert_eq!(summary.requeued, 1);
        assert_eq!(summary.failed_permanently, 0);

        let persisted = store.get_job(job_id).await.unwrap().unwrap();
        assert_eq!(persisted.state, JobState::Queued);
        assert_eq!(persisted.attempts, 1);
        assert_eq!(pqm.total_waiting(), 1);
    }

    #[tokio::test]
    async fn exhausted_attempts_mark_the_job_failed() {
        let now = jiff::Timestamp::now();
        let stale = now - jiff::SignedDuration::from_secs(200);
        let job = running_job(stale, stale, forge_core::job::DEFAULT_MAX_ATTEMPTS);
        let job_id = job.job_id;

        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        store.insert_job(&job).await.unwrap();

        let pqm = PriorityQueueManager::new(store.clone(), LaneCaps::default());
        let clock: Arc<dyn Clock> = Arc::new(FakeClock::new(now));
        let config = HealthConfig::default();

        let summary = recover_lost_jobs(&store, &pqm, &clock, &config).await.unwrap();
        assert_eq!(summary.requeued, 0);
        assert_eq!(summary.failed_permanently, 1);

        let persisted = store.get_job(job_id).await.unwrap().unwrap();
        assert_eq!(persisted.state, JobState::Failed);
        assert_eq!(pqm.total_waiting(), 0);
    }

    #[tokio::test]
    async fn fresh_heartbeat_is_not_a_recovery_candidate() {
        let now = jiff::Timestamp::now();
        let job = running_job(now, now, 0);

        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        store.insert_job(&job).await.unwrap();

        let pqm = PriorityQueueManager::new(store.clone(), LaneCaps::default());
        let clock: Arc<dyn Clock> = Arc::new(FakeClock::new(now));
        let config = HealthConfig::default();

        let summary = recover_lost_jobs(&store, &pqm, &clock, &config).await.unwrap();
        assert_eq!(summary, RecoverySummary::default());
    }
}
