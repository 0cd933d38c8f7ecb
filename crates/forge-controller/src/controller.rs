//! The Cluster Controller (component C10, §4.8): the only public entry
//! point into the fabric. Owns the worker registry, wires the periodic
//! health/recovery/backpressure and autoscaling loops together, and
//! implements the `Start`/`Submit`/`Status`/`Scale`/`UpdateConfig`/
//! `Shutdown` contract.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use forge_autoscale::{Autoscaler, LaneTarget, ScalePlan};
use forge_balancer::ClusterSnapshot;
use forge_core::clock::Clock;
use forge_core::events::{Event, EventSink};
use forge_core::job::{Job, Lane, TenantPlan};
use forge_core::process::Process;
use forge_core::quota::TenantQuota;
use forge_core::store::{QueueStat, Store};
use forge_core::worker::WorkerStatus;
use forge_health::{HealthMonitor, WorkerRegistry};
use forge_queue::PriorityQueueManager;
use forge_resource::Gate;
use forge_worker::MemoryProbe;
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::FabricConfig;
use crate::error::{Error, Result};
use crate::registry::WorkerSet;
use crate::view::{ClusterView, JobView, LaneView};

const TRACING_TARGET_CONTROLLER: &str = "forge_controller::controller";

/// Everything `Start` needs to assemble the fabric, gathered so the
/// constructor takes one argument instead of six (mirrors
/// `WorkerDeps`/`WorkerSet::new`, §4.3/§4.8).
#[allow(clippy::too_many_arguments)]
pub struct ControllerDeps {
    pub store: Arc<dyn Store>,
    pub events: Arc<dyn EventSink>,
    pub process: Arc<dyn Process>,
    pub quota: Arc<dyn TenantQuota>,
    pub clock: Arc<dyn Clock>,
    pub probe: Arc<dyn MemoryProbe>,
}

/// Tally returned by `Shutdown` (§4.8): how many workers were asked to
/// stop and how many jobs were still in flight when the drain began.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    pub workers_terminated: u32,
    pub residual_in_flight: u32,
}

/// The top-level orchestrator (§4.8). Background loops run for as long as
/// `shutdown` hasn't been called; `Submit` is rejected once it has.
pub struct ClusterController {
    config: RwLock<FabricConfig>,
    workers: Arc<WorkerSet>,
    pqm: Arc<PriorityQueueManager>,
    gate: Arc<Gate>,
    store: Arc<dyn Store>,
    events: Arc<dyn EventSink>,
    quota: Arc<dyn TenantQuota>,
    clock: Arc<dyn Clock>,
    health: Arc<HealthMonitor<WorkerSet>>,
    autoscaler: Mutex<Autoscaler>,
    shutting_down: AtomicBool,
    cancel: CancellationToken,
    background: Mutex<Vec<JoinHandle<()>>>,
    started_at: jiff::Timestamp,
}

impl ClusterController {
    /// Assembles every component, rebuilds the in-memory queue from the
    /// store, spawns `min_workers` distributed round-robin across the
    /// three lanes, and starts the health/recovery/backpressure and
    /// autoscale background loops (§4.8 `Start`).
    pub async fn start(deps: ControllerDeps, config: FabricConfig) -> Result<Arc<Self>> {
        config.validate().map_err(Error::InvalidConfig)?;

        let pqm = Arc::new(PriorityQueueManager::new(deps.store.clone(), Default::default()));
        pqm.rebuild().await.map_err(Error::Queue)?;

        let gate = Arc::new(Gate::new(config.resource));
        let workers = Arc::new(WorkerSet::new(
            pqm.clone(),
            gate.clone(),
            deps.store.clone(),
            deps.events.clone(),
            deps.process.clone(),
            deps.quota.clone(),
            deps.clock.clone(),
            deps.probe.clone(),
            config.worker,
        ));
        let health = Arc::new(HealthMonitor::new(workers.clone(), deps.clock.clone(), config.health));
        let autoscaler = Mutex::new(Autoscaler::new(config.autoscale));
        let started_at = deps.clock.now();

        let controller = Arc::new(Self {
            config: RwLock::new(config),
            workers,
            pqm,
            gate,
            store: deps.store,
            events: deps.events,
            quota: deps.quota,
            clock: deps.clock,
            health,
            autoscaler,
            shutting_down: AtomicBool::new(false),
            cancel: CancellationToken::new(),
            background: Mutex::new(Vec::new()),
            started_at,
        });

        for i in 0..config.autoscale.min_workers {
            let lane = Lane::ALL[i as usize % Lane::ALL.len()];
            controller.workers.spawn_worker(lane);
        }

        let monitor_handle = tokio::spawn(controller.clone().monitor_loop());
        let autoscale_handle = tokio::spawn(controller.clone().autoscale_loop());
        controller.background.lock().push(monitor_handle);
        controller.background.lock().push(autoscale_handle);

        tracing::info!(
            target: TRACING_TARGET_CONTROLLER,
            workers = config.autoscale.min_workers,
            "cluster controller started"
        );
        Ok(controller)
    }

    /// Admits a new job: checks the tenant's quota, assigns a lane, and
    /// persists it before handing it to the queue (§4.8 `Submit`, §6
    /// `InsufficientPages`).
    #[tracing::instrument(skip(self, file_ref), target = "forge_controller::controller")]
    pub async fn submit(
        &self,
        tenant_id: Uuid,
        file_ref: impl Into<String>,
        file_size_bytes: u64,
        tenant_plan: TenantPlan,
    ) -> Result<Uuid> {
        if self.shutting_down.load(Ordering::Acquire) {
            return Err(Error::ShuttingDown);
        }

        let quota = self.quota.check(tenant_id).await.map_err(Error::Core)?;
        if !quota.unlimited && quota.remaining <= 0 {
            return Err(Error::Core(forge_core::error::Error::insufficient_pages()));
        }

        let now = self.clock.now();
        let (large_threshold_bytes, max_attempts) = {
            let config = self.config.read();
            (config.resource.large_threshold_bytes, config.max_attempts)
        };
        let job = Job::submit(
            tenant_id,
            file_ref,
            file_size_bytes,
            tenant_plan,
            now,
            large_threshold_bytes,
            max_attempts,
        );
        let job_id = job.job_id;
        let lane = job.lane;

        self.store.insert_job(&job).await.map_err(Error::Core)?;
        self.pqm.submit(job).map_err(Error::Queue)?;
        self.events
            .emit(Event::JobSubmitted { job_id, tenant_id, lane, at: now })
            .await;

        Ok(job_id)
    }

    /// Reads a job's current public projection (§4.8 `Status`).
    pub async fn status(&self, job_id: Uuid) -> Result<Option<JobView>> {
        let job = self.store.get_job(job_id).await.map_err(Error::Core)?;
        Ok(job.as_ref().map(JobView::from_job))
    }

    /// A point-in-time read of every lane's worker/queue counts and
    /// resource saturation (§4.8 `GET cluster`).
    pub fn cluster_view(&self) -> ClusterView {
        let ledger = self.gate.snapshot();
        let lanes = Lane::ALL
            .iter()
            .map(|&lane| {
                let stats = self.pqm.peek_stats(lane);
                let worker_snapshot = self.workers.lane_worker_snapshot(lane);
                LaneView {
                    lane,
                    workers: self.workers.count_in_lane(lane),
                    idle: worker_snapshot.idle,
                    processing: worker_snapshot.processing,
                    waiting: stats.waiting,
                    running: stats.running,
                }
            })
            .collect();

        ClusterView {
            lanes,
            resource_mem_utilization: ledger.mem_utilization(),
            resource_concurrency_utilization: ledger.concurrency_utilization(),
            paused: ledger.paused,
            shutting_down: self.shutting_down.load(Ordering::Acquire),
        }
    }

    /// Manual override of the per-lane worker count, bounded by the
    /// configured `[min_workers, max_workers]` total (§4.8 `Scale`).
    pub async fn scale(&self, targets: &[(Lane, u32)]) -> Result<()> {
        let config = *self.config.read();
        let lane_targets: Vec<LaneTarget> = targets
            .iter()
            .map(|&(lane, target)| LaneTarget {
                lane,
                current: self.workers.count_in_lane(lane),
                target,
            })
            .collect();

        let total_target: u32 = lane_targets.iter().map(|t| t.target).sum();
        if total_target < config.autoscale.min_workers || total_target > config.autoscale.max_workers {
            return Err(Error::InvalidConfig(format!(
                "requested total of {total_target} workers is outside [{}, {}]",
                config.autoscale.min_workers, config.autoscale.max_workers
            )));
        }

        let plan = ScalePlan {
            lane_targets,
            reason: "manual scale request".to_string(),
        };
        self.apply_scale_plan(&plan).await;
        Ok(())
    }

    /// Validates and swaps the live configuration (§4.8 `UpdateConfig`).
    /// The autoscaler and worker pool pick up the new knobs immediately;
    /// an in-flight worker already running under the old poll/heartbeat
    /// timing finishes its current cycle under that timing. Health
    /// monitor thresholds and resource ceilings are fixed at `Start` and
    /// only take effect for a component on its next restart, since
    /// neither `HealthMonitor` nor `Gate` expose a live setter for them —
    /// a config change pushes the new `FabricConfig` into validation and
    /// status reporting either way.
    pub async fn update_config(&self, new_config: FabricConfig) -> Result<()> {
        if let Err(reason) = new_config.validate() {
            self.events
                .emit(Event::ConfigRejected { reason: reason.clone(), at: self.clock.now() })
                .await;
            return Err(Error::InvalidConfig(reason));
        }

        *self.config.write() = new_config;
        self.workers.update_worker_config(new_config.worker);
        self.autoscaler.lock().update_config(new_config.autoscale);
        tracing::info!(target: TRACING_TARGET_CONTROLLER, "configuration updated");
        Ok(())
    }

    /// Stops accepting new submissions, cancels the background loops, and
    /// terminates every worker within `deadline` (§4.8 `Shutdown`).
    pub async fn shutdown(&self, deadline: Duration) -> ShutdownReport {
        self.shutting_down.store(true, Ordering::Release);

        let snapshots = self.workers.snapshot_all().await;
        let residual_in_flight =
            snapshots.iter().filter(|s| s.status != WorkerStatus::Idle).count() as u32;

        self.cancel.cancel();
        for handle in self.background.lock().drain(..) {
            let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        }

        let worker_ids = self.workers.all_worker_ids();
        let workers_terminated = worker_ids.len() as u32;
        for worker_id in worker_ids {
            self.workers.terminate_worker(worker_id, deadline).await;
        }

        let uptime = self.clock.now().duration_since(self.started_at);
        tracing::info!(
            target: TRACING_TARGET_CONTROLLER,
            workers_terminated,
            residual_in_flight,
            uptime_seconds = uptime.as_secs(),
            "cluster controller shut down"
        );
        ShutdownReport { workers_terminated, residual_in_flight }
    }

    /// Health liveness scan, lost-job recovery, backpressure sampling, and
    /// `queue_stats` persistence, all on the health monitor's cadence
    /// (§4.4, §4.5, §4.2 Backpressure, §6). Recovery runs immediately
    /// after the liveness scan so a job is never left waiting behind a
    /// worker the scan just replaced.
    async fn monitor_loop(self: Arc<Self>) {
        let mut tick = tokio::time::interval(self.config.read().health.health_check_interval());
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tick.tick() => {}
            }

            self.health.run_once().await;

            let health_config = self.config.read().health;
            if let Err(error) = forge_health::recover_lost_jobs(
                &self.store,
                &self.pqm,
                &self.clock,
                &health_config,
            )
            .await
            {
                tracing::warn!(target: TRACING_TARGET_CONTROLLER, %error, "lost-job recovery pass failed");
            }

            self.sample_backpressure().await;
            self.persist_queue_stats().await;
        }
    }

    /// Samples the resource ledger's memory utilization against the
    /// configured thresholds and emits `ClusterPaused`/`ClusterResumed`
    /// exactly on the transition edge (§4.2 Backpressure, §6).
    async fn sample_backpressure(&self) {
        let was_paused = self.gate.is_paused();
        let resource = self.config.read().resource;
        self.gate.update_backpressure(resource.mem_pause_pct, resource.mem_resume_pct);
        let is_paused = self.gate.is_paused();

        if is_paused && !was_paused {
            let mem_pct = self.gate.snapshot().mem_utilization();
            self.events.emit(Event::ClusterPaused { mem_pct, at: self.clock.now() }).await;
        } else if !is_paused && was_paused {
            let mem_pct = self.gate.snapshot().mem_utilization();
            self.events.emit(Event::ClusterResumed { mem_pct, at: self.clock.now() }).await;
        }
    }

    /// Persists one windowed throughput sample per lane (§6 `queue_stats`
    /// table). This is the sole caller of `PriorityQueueManager::stats`,
    /// so it is the only place the recent-completion window is consumed.
    async fn persist_queue_stats(&self) {
        let now = self.clock.now();
        for lane in Lane::ALL {
            let stats = self.pqm.stats(lane);
            let result = self
                .store
                .append_queue_stat(QueueStat {
                    lane,
                    ts: now,
                    waiting: stats.waiting,
                    running: stats.running,
                    completed: stats.completed_recent,
                    failed: stats.failed_recent,
                })
                .await;
            if let Err(error) = result {
                tracing::warn!(target: TRACING_TARGET_CONTROLLER, %error, %lane, "failed to append queue stat");
            }
        }
    }

    /// Periodic reconciliation: builds a fresh snapshot, asks the
    /// autoscaler for a plan, and applies it (§4.7, §4.8).
    async fn autoscale_loop(self: Arc<Self>) {
        let mut tick = tokio::time::interval(self.config.read().autoscale.scale_check_interval());
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tick.tick() => {}
            }

            let snapshot = self.build_snapshot();
            let now = self.clock.now();
            let plan = self.autoscaler.lock().reconcile(now, &snapshot);
            if let Some(plan) = plan {
                self.apply_scale_plan(&plan).await;
            }
        }
    }

    fn build_snapshot(&self) -> ClusterSnapshot {
        let mut snapshot = ClusterSnapshot::default();
        for lane in Lane::ALL {
            snapshot.lane_stats.insert(lane, self.pqm.peek_stats(lane));
            snapshot.lane_workers.insert(lane, self.workers.lane_worker_snapshot(lane));
        }
        snapshot.resource = Some(self.gate.snapshot());
        snapshot
    }

    /// Grows a lane by spawning new workers, or shrinks it by terminating
    /// idle workers only — a lane with an in-flight job is never asked to
    /// give that worker up (§4.7 rule 3, §5 Liveness). Termination is
    /// fire-and-forget so a slow drain on one lane never blocks the next
    /// reconciliation cycle.
    async fn apply_scale_plan(&self, plan: &ScalePlan) {
        let grace = self.config.read().worker.grace_shutdown();

        for target in &plan.lane_targets {
            match target.delta() {
                delta if delta > 0 => {
                    for _ in 0..delta {
                        self.workers.spawn_worker(target.lane);
                    }
                }
                delta if delta < 0 => {
                    let to_remove = (-delta) as usize;
                    let idle = self.workers.idle_workers_in_lane(target.lane);
                    for worker_id in idle.into_iter().take(to_remove) {
                        let workers = self.workers.clone();
                        tokio::spawn(async move {
                            workers.terminate_worker(worker_id, grace).await;
                        });
                    }
                }
                _ => {}
            }
        }

        tracing::info!(
            target: TRACING_TARGET_CONTROLLER,
            target_total = plan.total_target(),
            reason = %plan.reason,
            "applied scale plan"
        );
    }
}
