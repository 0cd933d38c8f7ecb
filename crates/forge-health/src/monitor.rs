//! Health Monitor (component C7, §4.4).
//!
//! `HealthMonitor` never holds a worker's own lock: it reads a
//! [`WorkerSnapshot`] per cycle and, when replacement is warranted, calls
//! [`WorkerRegistry::replace`] — bounded, timeout-free operations the
//! registry owner (`forge-controller`) is responsible for completing
//! promptly. This is what lets HM "make progress independently of any
//! single blocked worker" (§5 Liveness).

use std::collections::HashMap;
use std::sync::Arc;

use forge_core::clock::Clock;
use forge_core::job::Lane;
use forge_core::worker::WorkerStatus;
use jiff::Timestamp;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::config::HealthConfig;

const TRACING_TARGET_HEALTH: &str = "forge_health::monitor";

/// A point-in-time read of one worker, the only input the monitor needs
/// per cycle (§4.4).
#[derive(Debug, Clone, Copy)]
pub struct WorkerSnapshot {
    pub worker_id: Uuid,
    pub lane: Lane,
    pub status: WorkerStatus,
    pub last_heartbeat: Timestamp,
    pub mem_used_bytes: u64,
}

/// Why the monitor decided to replace a worker, carried through to the
/// `WorkerReplaced` event (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceReason {
    /// Stale heartbeat for two consecutive cycles (§8 invariant 5).
    Stalled,
    /// `max_consecutive_failures` consecutive `Error` observations.
    RepeatedError,
    /// `mem_used_bytes` exceeded `worker_mem_ceiling_bytes`.
    MemoryRunaway,
}

impl ReplaceReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stalled => "stalled",
            Self::RepeatedError => "repeated_error",
            Self::MemoryRunaway => "memory_runaway",
        }
    }
}

/// Registry of live workers, implemented by `forge-controller`'s worker
/// set. The monitor only ever reads snapshots and requests replacement; it
/// never manipulates a worker's command mailbox directly (§9 Design Notes:
/// unidirectional ownership).
#[async_trait::async_trait]
pub trait WorkerRegistry: Send + Sync {
    async fn snapshot_all(&self) -> Vec<WorkerSnapshot>;

    /// Terminates `worker_id` and starts a fresh worker on the same lane
    /// (§4.4 Replacement).
    async fn replace(&self, worker_id: Uuid, lane: Lane, reason: ReplaceReason);

    /// Sets `worker_id`'s observed status to `Stalled` (§3, §4.4: "mark
    /// `Stalled`" on the first stale cycle, before replacement is
    /// warranted on the second).
    async fn mark_stalled(&self, worker_id: Uuid);
}

/// Tracked across cycles per worker, so the monitor can apply "two
/// consecutive cycles" (stall) and "N consecutive" (error) rules without
/// the registry itself keeping history.
#[derive(Debug, Clone, Copy, Default)]
struct Observed {
    consecutive_stale_cycles: u32,
    consecutive_errors: u32,
}

/// What one cycle's evaluation of a worker decided (§4.4).
enum Outcome {
    /// Terminate and respawn the worker.
    Replace(ReplaceReason),
    /// First stale cycle: observed but not yet replaceable.
    MarkStalled,
    /// Nothing to do.
    Healthy,
}

/// The fixed-interval liveness scanner (§4.4).
pub struct HealthMonitor<R: WorkerRegistry> {
    registry: Arc<R>,
    clock: Arc<dyn Clock>,
    config: HealthConfig,
    observed: Mutex<HashMap<Uuid, Observed>>,
}

impl<R: WorkerRegistry> HealthMonitor<R> {
    pub fn new(registry: Arc<R>, clock: Arc<dyn Clock>, config: HealthConfig) -> Self {
        Self {
            registry,
            clock,
            config,
            observed: Mutex::new(HashMap::new()),
        }
    }

    /// Runs the monitor forever on a fixed interval, until `cancel` fires.
    pub async fn run(&self, cancel: tokio_util::sync::CancellationToken) {
        let mut tick = tokio::time::interval(self.config.health_check_interval());
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tick.tick() => self.run_once().await,
            }
        }
    }

    /// Scans every worker once, replacing those that fail a liveness check.
    /// Errors from an individual worker's snapshot never abort the scan —
    /// one faulty iteration must not stop the loop (§7 Propagation).
    #[tracing::instrument(skip(self), target = "forge_health::monitor")]
    pub async fn run_once(&self) {
        let now = self.clock.now();
        let snapshots = self.registry.snapshot_all().await;
        let mut seen = std::collections::HashSet::new();

        for snapshot in snapshots {
            seen.insert(snapshot.worker_id);
            match self.evaluate(snapshot, now) {
                Outcome::Replace(reason) => {
                    tracing::warn!(
                        target: TRACING_TARGET_HEALTH,
                        worker_id = %snapshot.worker_id,
                        lane = %snapshot.lane,
                        reason = reason.as_str(),
                        "replacing unhealthy worker"
                    );
                    self.registry
                        .replace(snapshot.worker_id, snapshot.lane, reason)
                        .await;
                    self.observed.lock().remove(&snapshot.worker_id);
                }
                Outcome::MarkStalled => {
                    tracing::warn!(
                        target: TRACING_TARGET_HEALTH,
                        worker_id = %snapshot.worker_id,
                        lane = %snapshot.lane,
                        "worker missed its heartbeat deadline, marking stalled"
                    );
                    self.registry.mark_stalled(snapshot.worker_id).await;
                }
                Outcome::Healthy => {}
            }
        }

        // Drop bookkeeping for workers that no longer exist (already
        // replaced, or terminated by scale-down).
        self.observed.lock().retain(|id, _| seen.contains(id));
    }

    /// Pure liveness evaluation for one worker, given the current observed
    /// history (§4.4). Internal history is updated as a side effect so the
    /// "two consecutive cycles" / "N consecutive" rules carry across calls.
    fn evaluate(&self, snapshot: WorkerSnapshot, now: Timestamp) -> Outcome {
        if snapshot.mem_used_bytes > self.config.worker_mem_ceiling_bytes {
            return Outcome::Replace(ReplaceReason::MemoryRunaway);
        }

        let mut observed = self.observed.lock();
        let entry = observed.entry(snapshot.worker_id).or_default();

        let stale = now.duration_since(snapshot.last_heartbeat) > self.config.stall_threshold();
        if stale {
            entry.consecutive_stale_cycles += 1;
        } else {
            entry.consecutive_stale_cycles = 0;
        }

        if snapshot.status == WorkerStatus::Error {
            entry.consecutive_errors += 1;
        } else {
            entry.consecutive_errors = 0;
        }

        // Two consecutive stale cycles: the first marks Stalled (a label
        // only, not yet a replacement); the second triggers replacement
        // (§4.4, §8 invariant 5 — replaced before the third cycle
        // completes).
        if entry.consecutive_stale_cycles >= 2 {
            return Outcome::Replace(ReplaceReason::Stalled);
        }
        if entry.consecutive_errors >= self.config.max_consecutive_failures {
            return Outcome::Replace(ReplaceReason::RepeatedError);
        }
        if entry.consecutive_stale_cycles == 1 {
            return Outcome::MarkStalled;
        }
        Outcome::Healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_test::clock::FakeClock;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex as AsyncMutex;

    struct FakeRegistry {
        snapshots: AsyncMutex<Vec<WorkerSnapshot>>,
        replacements: AsyncMutex<Vec<(Uuid, ReplaceReason)>>,
        stalled: AsyncMutex<Vec<Uuid>>,
        replace_calls: AtomicUsize,
    }

    impl FakeRegistry {
        fn new(snapshots: Vec<WorkerSnapshot>) -> Self {
            Self {
                snapshots: AsyncMutex::new(snapshots),
                replacements: AsyncMutex::new(Vec::new()),
                stalled: AsyncMutex::new(Vec::new()),
                replace_calls: AtomicUsize::new(0),
            }
        }

        fn set_heartbeat(&self, worker_id: Uuid, at: Timestamp) {
            // Test-only synchronous helper; safe because no other task is
            // racing the mutex in these single-threaded scenarios.
            if let Ok(mut guard) = self.snapshots.try_lock() {
                for s in guard.iter_mut() {
                    if s.worker_id == worker_id {
                        s.last_heartbeat = at;
                    }
                }
            }
        }
    }

    #[async_trait::async_trait]
    impl WorkerRegistry for FakeRegistry {
        async fn snapshot_all(&self) -> Vec<WorkerSnapshot> {
            self.snapshots.lock().await.clone()
        }

        async fn replace(&self, worker_id: Uuid, _lane: Lane, reason: ReplaceReason) {
            self.replace_calls.fetch_add(1, Ordering::SeqCst);
            self.replacements.lock().await.push((worker_id, reason));
            self.snapshots.lock().await.retain(|s| s.worker_id != worker_id);
        }

        async fn mark_stalled(&self, worker_id: Uuid) {
            self.stalled.lock().await.push(worker_id);
            for s in self.snapshots.lock().await.iter_mut() {
                if s.worker_id == worker_id {
                    s.status = WorkerStatus::Stalled;
                }
            }
        }
    }

    fn snapshot(now: Timestamp) -> WorkerSnapshot {
        WorkerSnapshot {
            worker_id: Uuid::new_v4(),
            lane: Lane::Normal,
            status: WorkerStatus::Idle,
            last_heartbeat: now,
            mem_used_bytes: 0,
        }
    }

    #[tokio::test]
    async fn healthy_worker_is_never_replaced() {
        let now = Timestamp::now();
        let clock = Arc::new(FakeClock::new(now));
        let registry = Arc::new(FakeRegistry::new(vec![snapshot(now)]));
        let monitor = HealthMonitor::new(registry.clone(), clock, HealthConfig::default());

        monitor.run_once().await;
        assert!(registry.replacements.lock().await.is_empty());
    }

    #[tokio::test]
    async fn stall_replaces_after_two_consecutive_cycles() {
        let now = Timestamp::now();
        let clock = Arc::new(FakeClock::new(now));
        let worker = snapshot(now - jiff::SignedDuration::from_secs(120));
        let worker_id = worker.worker_id;
        let registry = Arc::new(FakeRegistry::new(vec![worker]));
        let config = HealthConfig {
            stall_threshold_ms: 60_000,
            ..HealthConfig::default()
        };
        let monitor = HealthMonitor::new(registry.clone(), clock, config);

        monitor.run_once().await;
        assert!(registry.replacements.lock().await.is_empty());
        assert_eq!(registry.stalled.lock().await.as_slice(), [worker_id]);

        monitor.run_once().await;
        let replacements = registry.replacements.lock().await;
        assert_eq!(replacements.len(), 1);
        assert_eq!(replacements[0], (worker_id, ReplaceReason::Stalled));
    }

    #[tokio::test]
    async fn first_stale_cycle_marks_the_worker_stalled_without_replacing() {
        let now = Timestamp::now();
        let clock = Arc::new(FakeClock::new(now));
        let worker = snapshot(now - jiff::SignedDuration::from_secs(120));
        let worker_id = worker.worker_id;
        let registry = Arc::new(FakeRegistry::new(vec![worker]));
        let config = HealthConfig {
            stall_threshold_ms: 60_000,
            ..HealthConfig::default()
        };
        let monitor = HealthMonitor::new(registry.clone(), clock, config);

        monitor.run_once().await;

        assert!(registry.replacements.lock().await.is_empty());
        assert_eq!(registry.stalled.lock().await.as_slice(), [worker_id]);
        let snapshots = registry.snapshots.lock().await;
        assert_eq!(snapshots[0].status, WorkerStatus::Stalled);
    }

    #[tokio::test]
    async fn fresh_heartbeat_resets_the_stall_counter() {
        let now = Timestamp::now();
        let clock = Arc::new(FakeClock::new(now));
        let worker = snapshot(now - jiff::SignedDuration::from_secs(120));
        let worker_id = worker.worker_id;
        let registry = Arc::new(FakeRegistry::new(vec![worker]));
        let config = HealthConfig {
            stall_threshold_ms: 60_000,
            ..HealthConfig::default()
        };
        let monitor = HealthMonitor::new(registry.clone(), clock, config);

        monitor.run_once().await;
        registry.set_heartbeat(worker_id, now);
        monitor.run_once().await;

        assert!(registry.replacements.lock().await.is_empty());
    }

    #[tokio::test]
    async fn repeated_error_replaces_after_max_consecutive_failures() {
        let now = Timestamp::now();
        let clock = Arc::new(FakeClock::new(now));
        let mut worker = snapshot(now);
        worker.status = WorkerStatus::Error;
        let worker_id = worker.worker_id;
        let registry = Arc::new(FakeRegistry::new(vec![worker]));
        let config = HealthConfig {
            max_consecutive_failures: 3,
            ..HealthConfig::default()
        };
        let monitor = HealthMonitor::new(registry.clone(), clock, config);

        monitor.run_once().await;
        monitor.run_once().await;
        assert!(registry.replacements.lock().await.is_empty());
        monitor.run_once().await;

        let replacements = registry.replacements.lock().await;
        assert_eq!(replacements.len(), 1);
        assert_eq!(replacements[0], (worker_id, ReplaceReason::RepeatedError));
    }

    #[tokio::test]
    async fn memory_runaway_replaces_immediately() {
        let now = Timestamp::now();
        let clock = Arc::new(FakeClock::new(now));
        let mut worker = snapshot(now);
        worker.mem_used_bytes = 10 * 1024 * 1024 * 1024;
        let worker_id = worker.worker_id;
        let registry = Arc::new(FakeRegistry::new(vec![worker]));
        let monitor = HealthMonitor::new(registry.clone(), clock, HealthConfig::default());

        monitor.run_once().await;
        let replacements = registry.replacements.lock().await;
        assert_eq!(replacements.len(), 1);
        assert_eq!(replacements[0], (worker_id, ReplaceReason::MemoryRunaway));
    }
}
