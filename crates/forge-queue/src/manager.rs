//! Priority Queue Manager (component C4, §4.1).

use std::collections::HashMap;
use std::sync::Arc;

use forge_core::job::{Job, Lane};
use forge_core::store::Store;
use jiff::Timestamp;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::waiting::WaitingSet;

const TRACING_TARGET_QUEUE: &str = "forge_queue::manager";

/// Point-in-time queue depth and throughput for one lane (§4.1 `Stats`).
///
/// `completed_recent`/`failed_recent` are counters accumulated since the
/// last call to `stats` for that lane — a caller that samples `stats`
/// periodically gets a windowed rate, matching how `queue_stats` rows are
/// appended (§6).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaneStats {
    pub waiting: u32,
    pub running: u32,
    pub completed_recent: u32,
    pub failed_recent: u32,
}

#[derive(Default)]
struct LaneState {
    waiting: WaitingSet,
    running: u32,
    completed_recent: u32,
    failed_recent: u32,
}

/// Optional per-lane cap on the waiting set. Not enforced unless
/// configured (§4.1 `Submit`).
#[derive(Debug, Clone, Copy, Default)]
pub struct LaneCaps {
    pub premium: Option<u32>,
    pub normal: Option<u32>,
    pub large: Option<u32>,
}

impl LaneCaps {
    fn get(&self, lane: Lane) -> Option<u32> {
        match lane {
            Lane::Premium => self.premium,
            Lane::Normal => self.normal,
            Lane::Large => self.large,
        }
    }
}

/// The three fixed lanes plus the bookkeeping `Claim`/`Requeue`/`Stats`
/// need. Durability against the Store is the caller's responsibility:
/// `PriorityQueueManager` keeps only the in-memory waiting set, rebuilt
/// from `Store::list_queued` via [`PriorityQueueManager::rebuild`] after a
/// restart (§4.1 Durability).
pub struct PriorityQueueManager {
    store: Arc<dyn Store>,
    lanes: Mutex<HashMap<Lane, LaneState>>,
    caps: LaneCaps,
}

impl PriorityQueueManager {
    pub fn new(store: Arc<dyn Store>, caps: LaneCaps) -> Self {
        let mut lanes = HashMap::new();
        for lane in Lane::ALL {
            lanes.insert(lane, LaneState::default());
        }
        Self {
            store,
            lanes: Mutex::new(lanes),
            caps,
        }
    }

    /// Rebuilds every lane's waiting set from jobs with `state = Queued` in
    /// the Store, for control-plane restart recovery (§4.1 Durability).
    #[tracing::instrument(skip(self), target = "forge_queue::manager")]
    pub async fn rebuild(&self) -> Result<()> {
        let queued = self
            .store
            .list_queued()
            .await
            .map_err(Error::Store)?;
        let mut lanes = self.lanes.lock();
        for job in queued {
            lanes.entry(job.lane).or_default().waiting.push(job);
        }
        Ok(())
    }

    /// Pure insert into the lane the job was already assigned (§4.1
    /// `Submit`). The caller (`forge-controller`) is responsible for
    /// `Store::insert_job` before calling this, so a crash between the two
    /// writes is recovered by `rebuild`.
    #[tracing::instrument(skip(self, job), target = "forge_queue::manager", fields(lane = %job.lane))]
    pub fn submit(&self, job: Job) -> Result<()> {
        let mut lanes = self.lanes.lock();
        let lane_state = lanes.entry(job.lane).or_default();
        if let Some(cap) = self.caps.get(job.lane) {
            if lane_state.waiting.len() as u32 >= cap {
                return Err(Error::queue_full(job.lane.as_str(), cap));
            }
        }
        lane_state.waiting.push(job);
        Ok(())
    }

    /// Returns the next job in `lane`, atomically marking it `Running`
    /// with `worker_id`/`started_at` (§4.1 `Claim`). The caller must still
    /// persist the returned job's new state via `Store::update_job`.
    pub fn claim(&self, lane: Lane, worker_id: Uuid, now: Timestamp) -> Option<Job> {
        let mut lanes = self.lanes.lock();
        let lane_state = lanes.entry(lane).or_default();
        let mut job = lane_state.waiting.pop()?;
        job.mark_running(worker_id, now);
        lane_state.running += 1;
        tracing::debug!(
            target: TRACING_TARGET_QUEUE,
            job_id = %job.job_id,
            %lane,
            "claimed job"
        );
        Some(job)
    }

    /// Returns a job to the head of its lane after a transient failure,
    /// incrementing `attempts`, or marks it `Failed` once attempts are
    /// exhausted (§4.1 `Requeue`). `increment_attempt` is `false` only for
    /// backpressure requeues (§7).
    pub fn requeue(&self, mut job: Job, now: Timestamp, increment_attempt: bool) -> Job {
        let mut lanes = self.lanes.lock();
        let lane_state = lanes.entry(job.lane).or_default();
        lane_state.running = lane_state.running.saturating_sub(1);

        if increment_attempt && !job.can_retry() {
            job.mark_failed(now, "max attempts exceeded");
            lane_state.failed_recent += 1;
            return job;
        }

        job.requeue(now, increment_attempt);
        lane_state.waiting.push(job.clone());
        job
    }

    pub fn record_completed(&self, lane: Lane) {
        let mut lanes = self.lanes.lock();
        let lane_state = lanes.entry(lane).or_default();
        lane_state.running = lane_state.running.saturating_sub(1);
        lane_state.completed_recent += 1;
    }

    pub fn record_failed(&self, lane: Lane) {
        let mut lanes = self.lanes.lock();
        let lane_state = lanes.entry(lane).or_default();
        lane_state.running = lane_state.running.saturating_sub(1);
        lane_state.failed_recent += 1;
    }

    /// Queue depth and recent throughput for `lane`, resetting the
    /// recent-completion counters (§4.1 `Stats`). Intended for the single
    /// caller that persists the windowed rate (the `queue_stats` append
    /// cadence, §6) — other readers should use [`Self::peek_stats`] so
    /// they don't clear a window out from under that caller.
    pub fn stats(&self, lane: Lane) -> LaneStats {
        let mut lanes = self.lanes.lock();
        let lane_state = lanes.entry(lane).or_default();
        let stats = LaneStats {
            waiting: lane_state.waiting.len() as u32,
            running: lane_state.running,
            completed_recent: lane_state.completed_recent,
            failed_recent: lane_state.failed_recent,
        };
        lane_state.completed_recent = 0;
        lane_state.failed_recent = 0;
        stats
    }

    /// Same reading as [`Self::stats`] but without resetting the
    /// recent-completion counters, for callers that just need a live
    /// depth/throughput read (the autoscaler's reconciliation snapshot,
    /// the public cluster status view) and must not steal the window from
    /// the `queue_stats` exporter.
    pub fn peek_stats(&self, lane: Lane) -> LaneStats {
        let lanes = self.lanes.lock();
        let lane_state = lanes.get(&lane);
        LaneStats {
            waiting: lane_state.map(|s| s.waiting.len() as u32).unwrap_or(0),
            running: lane_state.map(|s| s.running).unwrap_or(0),
            completed_recent: lane_state.map(|s| s.completed_recent).unwrap_or(0),
            failed_recent: lane_state.map(|s| s.failed_recent).unwrap_or(0),
        }
    }

    pub fn total_waiting(&self) -> u32 {
        let lanes = self.lanes.lock();
        lanes.values().map(|l| l.waiting.len() as u32).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_core::job::TenantPlan;
    use forge_test::store::InMemoryStore;

    fn job(plan: TenantPlan, lane: Lane, now: Timestamp) -> Job {
        let mut j = Job::submit(
            Uuid::new_v4(),
            "ref",
            1_000,
            plan,
            now,
            50_000_000,
            forge_core::job::DEFAULT_MAX_ATTEMPTS,
        );
        j.lane = lane;
        j.priority_key = lane.priority_key(plan);
        j
    }

    #[tokio::test]
    async fn claim_returns_jobs_in_priority_order() {
        let store = Arc::new(InMemoryStore::new());
        let pqm = PriorityQueueManager::new(store, LaneCaps::default());
        let now = Timestamp::now();

        pqm.submit(job(TenantPlan::Free, Lane::Normal, now)).unwrap();
        pqm.submit(job(TenantPlan::Basic, Lane::Normal, now)).unwrap();

        let worker_id = Uuid::new_v4();
        let first = pqm.claim(Lane::Normal, worker_id, now).unwrap();
        assert_eq!(first.tenant_plan, TenantPlan::Basic);
    }

    #[tokio::test]
    async fn claim_on_empty_lane_returns_none() {
        let store = Arc::new(InMemoryStore::new());
        let pqm = PriorityQueueManager::new(store, LaneCaps::default());
        assert!(pqm.claim(Lane::Premium, Uuid::new_v4(), Timestamp::now()).is_none());
    }

    #[tokio::test]
    async fn requeue_below_max_attempts_returns_to_queued() {
        let store = Arc::new(InMemoryStore::new());
        let pqm = PriorityQueueManager::new(store, LaneCaps::default());
        let now = Timestamp::now();
        let mut j = job(TenantPlan::Free, Lane::Normal, now);
        j.mark_running(Uuid::new_v4(), now);

        let requeued = pqm.requeue(j, now, true);
        assert_eq!(requeued.state, forge_core::job::JobState::Queued);
        assert_eq!(requeued.attempts, 1);
    }

    #[tokio::test]
    async fn requeue_past_max_attempts_marks_failed() {
        let store = Arc::new(InMemoryStore::new());
        let pqm = PriorityQueueManager::new(store, LaneCaps::default());
        let now = Timestamp::now();
        let mut j = job(TenantPlan::Free, Lane::Normal, now);
        j.attempts = j.max_attempts;
        j.mark_running(Uuid::new_v4(), now);

        let result = pqm.requeue(j, now, true);
        assert_eq!(result.state, forge_core::job::JobState::Failed);
    }

    #[tokio::test]
    async fn peek_stats_does_not_reset_recent_counters() {
        let store = Arc::new(InMemoryStore::new());
        let pqm = PriorityQueueManager::new(store, LaneCaps::default());
        pqm.record_completed(Lane::Normal);

        let peeked = pqm.peek_stats(Lane::Normal);
        assert_eq!(peeked.completed_recent, 1);
        let peeked_again = pqm.peek_stats(Lane::Normal);
        assert_eq!(peeked_again.completed_recent, 1);

        let consumed = pqm.stats(Lane::Normal);
        assert_eq!(consumed.completed_recent, 1);
        assert_eq!(pqm.peek_stats(Lane::Normal).completed_recent, 0);
    }

    #[tokio::test]
    async fn queue_full_rejects_past_cap() {
        let store = Arc::new(InMemoryStore::new());
        let caps = LaneCaps {
            normal: Some(1),
            ..Default::default()
        };
        let pqm = PriorityQueueManager::new(store, caps);
        let now = Timestamp::now();
        pqm.submit(job(TenantPlan::Free, Lane::Normal, now)).unwrap();
        let err = pqm.submit(job(TenantPlan::Free, Lane::Normal, now));
        assert!(err.is_err());
    }
}
