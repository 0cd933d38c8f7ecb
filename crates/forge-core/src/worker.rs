//! The `Worker` record (§3 Data Model).

use std::collections::HashSet;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::job::Lane;

/// Observed lifecycle state of a worker.
///
/// `Stalled` is an observed label set by the health monitor, never a
/// self-transition the worker performs (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    Idle,
    Processing,
    Stalled,
    Error,
    Terminating,
}

/// The concurrency a worker of a given lane is granted (§3): Premium
/// workers run two jobs at once, Normal and Large workers run one.
pub fn concurrency_for_lane(lane: Lane) -> usize {
    match lane {
        Lane::Premium => 2,
        Lane::Normal | Lane::Large => 1,
    }
}

/// A long-lived executor bound to one lane (§3, §4.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    pub worker_id: Uuid,
    pub lane: Lane,
    pub concurrency: usize,
    pub status: WorkerStatus,
    pub created_at: Timestamp,
    pub last_heartbeat: Timestamp,
    pub current_jobs: HashSet<Uuid>,
    pub jobs_completed: u64,
    pub jobs_failed: u64,
    pub avg_processing_ms: f64,
    pub mem_used_bytes: u64,
}

impl Worker {
    pub fn new(lane: Lane, now: Timestamp) -> Self {
        Self {
            worker_id: Uuid::new_v4(),
            lane,
            concurrency: concurrency_for_lane(lane),
            status: WorkerStatus::Idle,
            created_at: now,
            last_heartbeat: now,
            current_jobs: HashSet::new(),
            jobs_completed: 0,
            jobs_failed: 0,
            avg_processing_ms: 0.0,
            mem_used_bytes: 0,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.status == WorkerStatus::Idle && self.current_jobs.is_empty()
    }

    pub fn has_capacity(&self) -> bool {
        self.current_jobs.len() < self.concurrency
    }

    /// Records the worker taking on a job, updating `status` if this is its
    /// first active job (`status=Idle ⇔ current_jobs=∅`, §3 invariant).
    pub fn start_job(&mut self, job_id: Uuid, now: Timestamp) {
        self.current_jobs.insert(job_id);
        self.status = WorkerStatus::Processing;
        self.last_heartbeat = now;
    }

    /// Records a job leaving the worker (completed, failed, or requeued),
    /// returning the worker to `Idle` once no jobs remain.
    pub fn finish_job(&mut self, job_id: Uuid, processing_ms: f64, succeeded: bool, now: Timestamp) {
        self.current_jobs.remove(&job_id);
        if succeeded {
            self.jobs_completed += 1;
        } else {
            self.jobs_failed += 1;
        }
        let completed = self.jobs_completed + self.jobs_failed;
        if completed > 0 {
            self.avg_processing_ms +=
                (processing_ms - self.avg_processing_ms) / completed as f64;
        }
        self.last_heartbeat = now;
        if self.current_jobs.is_empty() {
            self.status = WorkerStatus::Idle;
        }
    }

    pub fn heartbeat(&mut self, now: Timestamp, mem_used_bytes: u64) {
        self.last_heartbeat = now;
        self.mem_used_bytes = mem_used_bytes;
    }

    pub fn mark_error(&mut self, now: Timestamp) {
        self.status = WorkerStatus::Error;
        self.last_heartbeat = now;
    }

    pub fn mark_stalled(&mut self) {
        self.status = WorkerStatus::Stalled;
    }

    pub fn mark_terminating(&mut self) {
        self.status = WorkerStatus::Terminating;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn premium_workers_get_concurrency_two() {
        assert_eq!(concurrency_for_lane(Lane::Premium), 2);
        assert_eq!(concurrency_for_lane(Lane::Normal), 1);
        assert_eq!(concurrency_for_lane(Lane::Large), 1);
    }

    #[test]
    fn idle_iff_no_current_jobs() {
        let now = Timestamp::now();
        let mut worker = Worker::new(Lane::Normal, now);
        assert!(worker.is_idle());

        let job_id = Uuid::new_v4();
        worker.start_job(job_id, now);
        assert!(!worker.is_idle());
        assert_eq!(worker.status, WorkerStatus::Processing);

        worker.finish_job(job_id, 120.0, true, now);
        assert!(worker.is_idle());
        assert_eq!(worker.jobs_completed, 1);
    }

    #[test]
    fn capacity_respects_concurrency_limit() {
        let now = Timestamp::now();
        let mut worker = Worker::new(Lane::Premium, now);
        assert!(worker.has_capacity());
        worker.start_job(Uuid::new_v4(), now);
        assert!(worker.has_capacity());
        worker.start_job(Uuid::new_v4(), now);
        assert!(!worker.has_capacity());
    }
}
