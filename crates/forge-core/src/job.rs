//! The `Job` record, its lifecycle states, and lane/priority assignment
//! (§3 Data Model, §4.1 lane selection).

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tenant's subscription tier. Determines intra-lane priority and, for
/// `Pro`/`Enterprise`/`Unlimited`, eligibility for the Premium lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantPlan {
    Free,
    Basic,
    Pro,
    Enterprise,
    Unlimited,
}

impl TenantPlan {
    /// The intra-lane priority key for this plan. Lower sorts earlier.
    pub fn priority_key(self) -> u8 {
        match self {
            Self::Unlimited => 1,
            Self::Enterprise => 2,
            Self::Pro => 3,
            Self::Basic => 4,
            Self::Free => 5,
        }
    }

    fn is_premium_eligible(self) -> bool {
        matches!(self, Self::Pro | Self::Enterprise | Self::Unlimited)
    }
}

/// One of the three fixed lanes a job can be routed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lane {
    Premium,
    Normal,
    Large,
}

impl Lane {
    /// All three fixed lanes, in a stable iteration order.
    pub const ALL: [Lane; 3] = [Lane::Premium, Lane::Normal, Lane::Large];

    /// Lane selection rule (§4.1): large files always win, regardless of
    /// plan; otherwise plan determines Premium vs. Normal.
    pub fn select(tenant_plan: TenantPlan, file_size_bytes: u64, large_threshold_bytes: u64) -> Lane {
        if file_size_bytes >= large_threshold_bytes {
            Lane::Large
        } else if tenant_plan.is_premium_eligible() {
            Lane::Premium
        } else {
            Lane::Normal
        }
    }

    /// Intra-lane priority key for a job in this lane (§4.1 table: Large
    /// lane jobs always carry key 4 regardless of plan).
    pub fn priority_key(self, tenant_plan: TenantPlan) -> u8 {
        match self {
            Lane::Large => 4,
            Lane::Premium | Lane::Normal => tenant_plan.priority_key(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Lane::Premium => "premium",
            Lane::Normal => "normal",
            Lane::Large => "large",
        }
    }
}

impl std::fmt::Display for Lane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a `Job` (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Running,
    Completed,
    Failed,
    LostWorker,
    Cancelled,
}

impl JobState {
    /// Terminal states are never left once entered (§8 invariant 3).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Default memory/attempt bounds used when constructing a job descriptor.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// A unit of submitted work (§3 Data Model).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub job_id: Uuid,
    pub tenant_id: Uuid,
    pub submitted_at: Timestamp,
    pub file_ref: String,
    pub file_size_bytes: u64,
    pub tenant_plan: TenantPlan,
    pub attempts: u32,
    pub max_attempts: u32,
    pub priority_key: u8,
    pub lane: Lane,
    pub state: JobState,
    pub worker_id: Option<Uuid>,
    pub started_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
    pub last_heartbeat: Option<Timestamp>,
    pub last_error: Option<String>,
}

impl Job {
    /// Builds a freshly submitted job, computing its lane and priority key
    /// from the tenant plan and file size (§4.1).
    #[allow(clippy::too_many_arguments)]
    pub fn submit(
        tenant_id: Uuid,
        file_ref: impl Into<String>,
        file_size_bytes: u64,
        tenant_plan: TenantPlan,
        submitted_at: Timestamp,
        large_threshold_bytes: u64,
        max_attempts: u32,
    ) -> Self {
        let lane = Lane::select(tenant_plan, file_size_bytes, large_threshold_bytes);
        let priority_key = lane.priority_key(tenant_plan);

        Self {
            job_id: Uuid::new_v4(),
            tenant_id,
            submitted_at,
            file_ref: file_ref.into(),
            file_size_bytes,
            tenant_plan,
            attempts: 0,
            max_attempts,
            priority_key,
            lane,
            state: JobState::Queued,
            worker_id: None,
            started_at: None,
            finished_at: None,
            last_heartbeat: None,
            last_error: None,
        }
    }

    /// The ordering key `Claim` uses within a lane (§4.1): lexicographic on
    /// `(priority_key, submitted_at, job_id)`.
    pub fn ordering_key(&self) -> (u8, Timestamp, Uuid) {
        (self.priority_key, self.submitted_at, self.job_id)
    }

    pub fn can_retry(&self) -> bool {
        self.attempts < self.max_attempts
    }

    /// Transitions this job to `Running`, assigning the claiming worker
    /// (§4.1 `Claim`).
    pub fn mark_running(&mut self, worker_id: Uuid, now: Timestamp) {
        self.state = JobState::Running;
        self.worker_id = Some(worker_id);
        self.started_at = Some(now);
        self.last_heartbeat = Some(now);
    }

    /// Returns this job to `Queued` after a transient failure or recovery,
    /// incrementing `attempts` and refreshing `submitted_at` so it wins
    /// ties against newer work of the same plan (§4.5, Design Notes open
    /// question 1).
    pub fn requeue(&mut self, now: Timestamp, increment_attempt: bool) {
        if increment_attempt {
            self.attempts += 1;
        }
        self.state = JobState::Queued;
        self.worker_id = None;
        self.started_at = None;
        self.last_heartbeat = None;
        self.submitted_at = now;
    }

    pub fn mark_completed(&mut self, now: Timestamp) {
        self.state = JobState::Completed;
        self.finished_at = Some(now);
    }

    pub fn mark_failed(&mut self, now: Timestamp, reason: impl Into<String>) {
        self.state = JobState::Failed;
        self.finished_at = Some(now);
        self.last_error = Some(reason.into());
    }

    pub fn mark_lost_worker(&mut self, now: Timestamp, reason: impl Into<String>) {
        self.state = JobState::LostWorker;
        self.last_error = Some(reason.into());
        self.last_heartbeat = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant() -> Uuid {
        Uuid::new_v4()
    }

    #[test]
    fn large_file_always_selects_large_lane() {
        assert_eq!(
            Lane::select(TenantPlan::Free, 100_000_000, 50_000_000),
            Lane::Large
        );
        assert_eq!(
            Lane::select(TenantPlan::Enterprise, 100_000_000, 50_000_000),
            Lane::Large
        );
    }

    #[test]
    fn large_threshold_is_inclusive() {
        assert_eq!(
            Lane::select(TenantPlan::Free, 50_000_000, 50_000_000),
            Lane::Large
        );
    }

    #[test]
    fn premium_plans_route_to_premium_lane() {
        for plan in [TenantPlan::Pro, TenantPlan::Enterprise, TenantPlan::Unlimited] {
            assert_eq!(Lane::select(plan, 1_000, 50_000_000), Lane::Premium);
        }
    }

    #[test]
    fn basic_and_free_route_to_normal_lane() {
        for plan in [TenantPlan::Free, TenantPlan::Basic] {
            assert_eq!(Lane::select(plan, 1_000, 50_000_000), Lane::Normal);
        }
    }

    #[test]
    fn large_lane_priority_key_is_always_four() {
        let job = Job::submit(
            tenant(),
            "s3://bucket/key",
            100_000_000,
            TenantPlan::Enterprise,
            Timestamp::now(),
            50_000_000,
            DEFAULT_MAX_ATTEMPTS,
        );
        assert_eq!(job.lane, Lane::Large);
        assert_eq!(job.priority_key, 4);
    }

    #[test]
    fn unlimited_plan_has_the_lowest_priority_key() {
        assert_eq!(TenantPlan::Unlimited.priority_key(), 1);
        assert!(TenantPlan::Unlimited.priority_key() < TenantPlan::Free.priority_key());
    }

    #[test]
    fn terminal_states_are_recognized() {
        assert!(JobState::Completed.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(JobState::Cancelled.is_terminal());
        assert!(!JobState::Queued.is_terminal());
        assert!(!JobState::Running.is_terminal());
        assert!(!JobState::LostWorker.is_terminal());
    }

    #[test]
    fn requeue_without_increment_preserves_attempts() {
        let mut job = Job::submit(
            tenant(),
            "s3://bucket/key",
            1_000,
            TenantPlan::Free,
            Timestamp::now(),
            50_000_000,
            DEFAULT_MAX_ATTEMPTS,
        );
        job.mark_running(Uuid::new_v4(), Timestamp::now());
        job.requeue(Timestamp::now(), false);
        assert_eq!(job.attempts, 0);
        assert_eq!(job.state, JobState::Queued);
        assert!(job.worker_id.is_none());
    }

    #[test]
    fn requeue_with_increment_bumps_attempts() {
        let mut job = Job::submit(
            tenant(),
            "s3://bucket/key",
            1_000,
            TenantPlan::Free,
            Timestamp::now(),
            50_000_000,
            DEFAULT_MAX_ATTEMPTS,
        );
        job.requeue(Timestamp::now(), true);
        assert_eq!(job.attempts, 1);
    }
}
