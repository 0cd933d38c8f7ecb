//! The live worker set: owns every spawned worker, implements
//! [`forge_health::WorkerRegistry`] so the health monitor can read
//! snapshots and request replacement without touching mailboxes directly
//! (§4.4, §4.8).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use forge_core::clock::Clock;
use forge_core::events::{Event, EventSink};
use forge_core::job::Lane;
use forge_core::process::Process;
use forge_core::quota::TenantQuota;
use forge_core::store::Store;
use forge_health::{ReplaceReason, WorkerRegistry, WorkerSnapshot};
use forge_queue::PriorityQueueManager;
use forge_resource::Gate;
use forge_worker::{MemoryProbe, WorkerConfig, WorkerDeps, WorkerHandle};
use parking_lot::RwLock;
use tokio::task::JoinHandle;
use uuid::Uuid;

const TRACING_TARGET_REGISTRY: &str = "forge_controller::registry";

struct Managed {
    handle: WorkerHandle,
    join: JoinHandle<()>,
}

/// Owns every live `WorkerHandle`, the fixed dependency bundle new workers
/// are spawned with, and the current `WorkerConfig` (read fresh from
/// `UpdateConfig` at the next spawn, §4.8).
pub struct WorkerSet {
    deps: WorkerDeps,
    worker_config: RwLock<WorkerConfig>,
    workers: RwLock<HashMap<Uuid, Managed>>,
}

impl WorkerSet {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pqm: Arc<PriorityQueueManager>,
        gate: Arc<Gate>,
        store: Arc<dyn Store>,
        events: Arc<dyn EventSink>,
        process: Arc<dyn Process>,
        quota: Arc<dyn TenantQuota>,
        clock: Arc<dyn Clock>,
        probe: Arc<dyn MemoryProbe>,
        worker_config: WorkerConfig,
    ) -> Self {
        Self {
            deps: WorkerDeps {
                pqm,
                gate,
                store,
                events,
                process,
                quota,
                clock,
                probe,
            },
            worker_config: RwLock::new(worker_config),
            workers: RwLock::new(HashMap::new()),
        }
    }

    pub fn update_worker_config(&self, config: WorkerConfig) {
        *self.worker_config.write() = config;
    }

    /// Spawns one worker bound to `lane`, returning its id (§4.8 `Start`,
    /// and the autoscaler's `ScaleTo`).
    pub fn spawn_worker(&self, lane: Lane) -> Uuid {
        let config = *self.worker_config.read();
        let (handle, join) = forge_worker::spawn(lane, self.deps.clone(), config);
        let worker_id = handle.worker_id();
        self.workers.write().insert(worker_id, Managed { handle, join });
        tracing::info!(target: TRACING_TARGET_REGISTRY, %worker_id, %lane, "spawned worker");
        worker_id
    }

    /// Sends `Terminate` and waits (bounded by `grace`) for the worker's
    /// task to finish, for `Shutdown` and scale-down (§4.3, §4.7, §4.8).
    pub async fn terminate_worker(&self, worker_id: Uuid, grace: Duration) {
        let managed = self.workers.write().remove(&worker_id);
        let Some(managed) = managed else { return };

        managed.handle.terminate().await;
        if tokio::time::timeout(grace, managed.join).await.is_err() {
            tracing::warn!(
                target: TRACING_TARGET_REGISTRY,
                %worker_id,
                "worker did not stop within the grace period"
            );
        }
    }

    /// Worker ids currently assigned to `lane`, for the autoscaler to pick
    /// scale-down candidates from (§4.7 rule 3).
    pub fn idle_workers_in_lane(&self, lane: Lane) -> Vec<Uuid> {
        self.workers
            .read()
            .values()
            .filter(|m| m.handle.lane() == lane && m.handle.snapshot().is_idle())
            .map(|m| m.handle.worker_id())
            .collect()
    }

    pub fn count_in_lane(&self, lane: Lane) -> u32 {
        self.workers.read().values().filter(|m| m.handle.lane() == lane).count() as u32
    }

    pub fn total_count(&self) -> u32 {
        self.workers.read().len() as u32
    }

    pub fn all_worker_ids(&self) -> Vec<Uuid> {
        self.workers.read().keys().copied().collect()
    }

    pub fn lane_worker_snapshot(&self, lane: Lane) -> forge_balancer::LaneWorkerSnapshot {
        let workers = self.workers.read();
        let mut idle = 0u32;
        let mut processing = 0u32;
        let mut total_avg = 0.0;
        let mut counted = 0u32;

        for managed in workers.values().filter(|m| m.handle.lane() == lane) {
            let snapshot = managed.handle.snapshot();
            if snapshot.is_idle() {
                idle += 1;
            } else {
                processing += 1;
            }
            total_avg += snapshot.avg_processing_ms;
            counted += 1;
        }

        forge_balancer::LaneWorkerSnapshot {
            idle,
            processing,
            avg_processing_ms: if counted == 0 { 0.0 } else { total_avg / counted as f64 },
        }
    }
}

#[async_trait::async_trait]
impl WorkerRegistry for WorkerSet {
    async fn snapshot_all(&self) -> Vec<WorkerSnapshot> {
        self.workers
            .read()
            .values()
            .map(|m| {
                let worker = m.handle.snapshot();
                WorkerSnapshot {
                    worker_id: worker.worker_id,
                    lane: worker.lane,
                    status: worker.status,
                    last_heartbeat: worker.last_heartbeat,
                    mem_used_bytes: worker.mem_used_bytes,
                }
            })
            .collect()
    }

    /// Sets `worker_id`'s observed status to `Stalled` (§3, §4.4: the first
    /// stale cycle marks only, the second cycle triggers `replace`). A
    /// worker that has already been removed (e.g. raced by a concurrent
    /// replacement) is silently ignored.
    async fn mark_stalled(&self, worker_id: Uuid) {
        if let Some(managed) = self.workers.read().get(&worker_id) {
            managed.handle.mark_stalled();
        }
    }

    /// Terminates `worker_id` and starts a fresh one on the same lane
    /// (§4.4 Replacement). Termination is fire-and-forget here — the
    /// health monitor must not block its scan on a slow drain — so the
    /// grace period is the worker's own configured shutdown grace.
    async fn replace(&self, worker_id: Uuid, lane: Lane, reason: ReplaceReason) {
        let new_worker_id = self.spawn_worker(lane);
        let grace = self.worker_config.read().grace_shutdown();

        self.deps
            .events
            .emit(Event::WorkerReplaced {
                old_worker_id: worker_id,
                new_worker_id,
                lane,
                reason: reason.as_str().to_string(),
                at: self.deps.clock.now(),
            })
            .await;

        let managed = self.workers.write().remove(&worker_id);
        if let Some(managed) = managed {
            tokio::spawn(async move {
                managed.handle.terminate().await;
                let _ = tokio::time::timeout(grace, managed.join).await;
            });
        }
    }
}
