//! The worker main loop (§4.3): claim-then-acquire admission, concurrent
//! job execution bounded by lane concurrency, heartbeats, and cooperative
//! cancellation on `Terminate`.

use std::collections::HashMap;
use std::sync::Arc;

use forge_core::clock::Clock;
use forge_core::error::ErrorClass;
use forge_core::events::{Event, EventSink};
use forge_core::job::{Job, JobState, Lane};
use forge_core::process::{Process, ProcessOutcome};
use forge_core::quota::TenantQuota;
use forge_core::store::{JobUpdate, Store, WorkerMetric};
use forge_core::worker::Worker as CoreWorker;
use forge_queue::PriorityQueueManager;
use forge_resource::{Gate, Ticket, backpressure_retry_delay};
use jiff::Timestamp;
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::WorkerConfig;
use crate::probe::MemoryProbe;

const TRACING_TARGET_WORKER: &str = "forge_worker::runtime";

/// A command sent to a running worker over its mailbox.
#[derive(Debug, Clone, Copy)]
pub enum WorkerCommand {
    /// Stop claiming new work and drain in-flight jobs within the
    /// configured grace period (§4.3 Termination).
    Terminate,
}

/// The external collaborators a worker needs, bundled so `spawn` takes one
/// argument instead of seven (§4.3).
pub struct WorkerDeps {
    pub pqm: Arc<PriorityQueueManager>,
    pub gate: Arc<Gate>,
    pub store: Arc<dyn Store>,
    pub events: Arc<dyn EventSink>,
    pub process: Arc<dyn Process>,
    pub quota: Arc<dyn TenantQuota>,
    pub clock: Arc<dyn Clock>,
    pub probe: Arc<dyn MemoryProbe>,
}

impl Clone for WorkerDeps {
    fn clone(&self) -> Self {
        Self {
            pqm: Arc::clone(&self.pqm),
            gate: Arc::clone(&self.gate),
            store: Arc::clone(&self.store),
            events: Arc::clone(&self.events),
            process: Arc::clone(&self.process),
            quota: Arc::clone(&self.quota),
            clock: Arc::clone(&self.clock),
            probe: Arc::clone(&self.probe),
        }
    }
}

/// A job on loan to a running task, tracked so a forced shutdown can
/// release its ticket and requeue it (§4.3 Termination, hard kill path).
struct InFlight {
    job: Job,
    ticket: Ticket,
}

/// A handle to a spawned worker: its identity, a read-only view of its
/// state, and its command mailbox.
pub struct WorkerHandle {
    worker_id: Uuid,
    lane: Lane,
    state: Arc<RwLock<CoreWorker>>,
    commands: mpsc::Sender<WorkerCommand>,
}

impl WorkerHandle {
    pub fn worker_id(&self) -> Uuid {
        self.worker_id
    }

    pub fn lane(&self) -> Lane {
        self.lane
    }

    /// A snapshot of this worker's `forge_core::Worker` record, for
    /// `forge-health`/`forge-controller` to read without locking the
    /// running loop.
    pub fn snapshot(&self) -> CoreWorker {
        self.state.read().clone()
    }

    /// Requests graceful shutdown; returns once the command is enqueued,
    /// not once the worker has actually stopped (§4.3 Termination).
    pub async fn terminate(&self) {
        let _ = self.commands.send(WorkerCommand::Terminate).await;
    }

    /// Marks this worker `Stalled` without terminating it — the first
    /// stale heartbeat cycle only labels the worker, it does not yet
    /// replace it (§3, §4.4).
    pub fn mark_stalled(&self) {
        self.state.write().mark_stalled();
    }
}

/// Spawns a worker bound to `lane`, returning a handle plus the task
/// driving its main loop.
pub fn spawn(
    lane: Lane,
    deps: WorkerDeps,
    config: WorkerConfig,
) -> (WorkerHandle, tokio::task::JoinHandle<()>) {
    let now = deps.clock.now();
    let core = CoreWorker::new(lane, now);
    let worker_id = core.worker_id;
    let state = Arc::new(RwLock::new(core));
    let (tx, rx) = mpsc::channel(8);

    let handle = WorkerHandle {
        worker_id,
        lane,
        state: Arc::clone(&state),
        commands: tx,
    };

    let join = tokio::spawn(run(worker_id, lane, deps, config, state, rx));

    (handle, join)
}

async fn run(
    worker_id: Uuid,
    lane: Lane,
    deps: WorkerDeps,
    config: WorkerConfig,
    state: Arc<RwLock<CoreWorker>>,
    mut commands: mpsc::Receiver<WorkerCommand>,
) {
    let cancel = CancellationToken::new();
    let in_flight: Arc<Mutex<HashMap<Uuid, InFlight>>> = Arc::new(Mutex::new(HashMap::new()));
    let mut tasks: JoinSet<()> = JoinSet::new();
    let mut poll_tick = tokio::time::interval(config.poll_interval());
    let mut heartbeat_tick = tokio::time::interval(config.heartbeat_interval());

    tracing::info!(target: TRACING_TARGET_WORKER, %worker_id, %lane, "worker started");

    loop {
        tokio::select! {
            cmd = commands.recv() => {
                match cmd {
                    Some(WorkerCommand::Terminate) | None => break,
                }
            }
            _ = heartbeat_tick.tick() => {
                heartbeat(worker_id, &deps, &state, &in_flight).await;
            }
            _ = poll_tick.tick() => {
                try_claim_and_dispatch(worker_id, lane, &deps, &state, &in_flight, &mut tasks, &cancel).await;
            }
            Some(result) = tasks.join_next(), if !tasks.is_empty() => {
                if let Err(err) = result {
                    tracing::warn!(target: TRACING_TARGET_WORKER, %worker_id, %err, "job task panicked");
                }
            }
        }
    }

    tracing::info!(target: TRACING_TARGET_WORKER, %worker_id, "terminate received, draining in-flight jobs");
    state.write().mark_terminating();
    cancel.cancel();

    let drained = tokio::time::timeout(config.grace_shutdown(), async {
        while tasks.join_next().await.is_some() {}
    })
    .await;

    if drained.is_err() {
        tracing::warn!(target: TRACING_TARGET_WORKER, %worker_id, "grace shutdown expired, forcing survivors");
        tasks.abort_all();
        while tasks.join_next().await.is_some() {}
        force_recover_survivors(&deps, &in_flight).await;
    }

    tracing::info!(target: TRACING_TARGET_WORKER, %worker_id, "worker stopped");
}

/// Claims the next job for `lane` if the worker has spare concurrency,
/// then tries to admit it through the gate (§4.2/§4.3: claim-then-acquire,
/// never the reverse, so a rejected acquisition only ever holds a claimed
/// job, never a half-admitted one).
async fn try_claim_and_dispatch(
    worker_id: Uuid,
    lane: Lane,
    deps: &WorkerDeps,
    state: &Arc<RwLock<CoreWorker>>,
    in_flight: &Arc<Mutex<HashMap<Uuid, InFlight>>>,
    tasks: &mut JoinSet<()>,
    cancel: &CancellationToken,
) {
    if !state.read().has_capacity() {
        return;
    }

    let now = deps.clock.now();
    let Some(job) = deps.pqm.claim(lane, worker_id, now) else {
        return;
    };

    match deps.gate.acquire(&job) {
        Ok(ticket) => {
            if let Err(err) = deps
                .store
                .update_job(job.job_id, JobUpdate::from_job(&job, None))
                .await
            {
                tracing::warn!(target: TRACING_TARGET_WORKER, %err, job_id = %job.job_id, "failed to persist claimed job");
            }

            state.write().start_job(job.job_id, now);
            in_flight.lock().insert(
                job.job_id,
                InFlight {
                    job: job.clone(),
                    ticket,
                },
            );

            let deps = deps.clone();
            let state = Arc::clone(state);
            let in_flight = Arc::clone(in_flight);
            let job_cancel = cancel.child_token();
            tasks.spawn(async move {
                run_job(worker_id, job, ticket, deps, state, in_flight, job_cancel).await;
            });
        }
        Err(_rejected) => {
            let now = deps.clock.now();
            let requeued = deps.pqm.requeue(job, now, false);
            if let Err(err) = deps
                .store
                .update_job(requeued.job_id, JobUpdate::from_job(&requeued, None))
                .await
            {
                tracing::warn!(target: TRACING_TARGET_WORKER, %err, job_id = %requeued.job_id, "failed to persist backpressure requeue");
            }
            tokio::time::sleep(backpressure_retry_delay()).await;
        }
    }
}

/// Runs one claimed job against `Process` and reduces its outcome to the
/// §7 policy: success persists and deducts quota, `FatalToJob` fails the
/// job outright, `WorkerLocal` marks both the job `LostWorker` and this
/// worker `Error`, and everything else requeues (§7 Propagation).
async fn run_job(
    worker_id: Uuid,
    job: Job,
    ticket: Ticket,
    deps: WorkerDeps,
    state: Arc<RwLock<CoreWorker>>,
    in_flight: Arc<Mutex<HashMap<Uuid, InFlight>>>,
    cancel: CancellationToken,
) {
    let job_id = job.job_id;
    let lane = job.lane;
    let started = deps.clock.now();

    let outcome = deps.process.process(cancel.child_token(), &job).await;
    let now = deps.clock.now();
    let processing_ms = elapsed_ms(started, now);

    in_flight.lock().remove(&job_id);
    deps.gate.release(ticket);

    if cancel.is_cancelled() {
        // Shutdown in progress: this result raced the grace-period drain.
        // Requeue without penalty regardless of what `Process` reported
        // (§4.3 Termination: jobs finishing inside the grace period are
        // not treated as failures).
        let requeued = deps.pqm.requeue(job, now, false);
        persist(&deps, &requeued).await;
        state.write().finish_job(job_id, processing_ms, false, now);
        return;
    }

    match outcome {
        ProcessOutcome::Success { result_ref } => {
            let mut completed = job.clone();
            completed.mark_completed(now);
            if let Err(err) = deps
                .store
                .update_job(job_id, JobUpdate::from_job(&completed, Some(result_ref)))
                .await
            {
                tracing::warn!(target: TRACING_TARGET_WORKER, %err, %job_id, "failed to persist completed job");
            }

            let pages = pages_for(job.file_size_bytes);
            if let Err(err) = deps.quota.deduct(job.tenant_id, pages).await {
                tracing::warn!(target: TRACING_TARGET_WORKER, %err, %job_id, "failed to deduct tenant quota");
            }

            deps.pqm.record_completed(lane);
            state.write().finish_job(job_id, processing_ms, true, now);
            deps.events
                .emit(Event::JobCompleted {
                    job_id,
                    worker_id,
                    at: now,
                })
                .await;
        }
        ProcessOutcome::Failure { error, class } => match class {
            ErrorClass::WorkerLocal => {
                let mut lost = job.clone();
                lost.mark_lost_worker(now, error.to_string());
                persist(&deps, &lost).await;
                deps.pqm.record_failed(lane);

                // Unlike a normal job exit, a `WorkerLocal` failure taints
                // this worker: the health monitor is expected to replace
                // it (§4.3), so it does not return to `Idle`.
                let mut guard = state.write();
                guard.current_jobs.remove(&job_id);
                guard.jobs_failed += 1;
                guard.mark_error(now);
            }
            ErrorClass::Transient => {
                let requeued = deps.pqm.requeue(job, now, true);
                let became_failed = requeued.state == JobState::Failed;
                persist(&deps, &requeued).await;
                state.write().finish_job(job_id, processing_ms, false, now);
                if became_failed {
                    deps.events
                        .emit(Event::JobFailed {
                            job_id,
                            reason: requeued.last_error.clone().unwrap_or_default(),
                            at: now,
                        })
                        .await;
                }
            }
            ErrorClass::FatalToJob | ErrorClass::Configuration | ErrorClass::System => {
                let mut failed = job.clone();
                failed.mark_failed(now, error.to_string());
                persist(&deps, &failed).await;
                deps.pqm.record_failed(lane);
                state.write().finish_job(job_id, processing_ms, false, now);
                deps.events
                    .emit(Event::JobFailed {
                        job_id,
                        reason: failed.last_error.clone().unwrap_or_default(),
                        at: now,
                    })
                    .await;
            }
        },
    }
}

async fn persist(deps: &WorkerDeps, job: &Job) {
    if let Err(err) = deps
        .store
        .update_job(job.job_id, JobUpdate::from_job(job, None))
        .await
    {
        tracing::warn!(target: TRACING_TARGET_WORKER, %err, job_id = %job.job_id, "failed to persist job transition");
    }
}

async fn heartbeat(
    worker_id: Uuid,
    deps: &WorkerDeps,
    state: &Arc<RwLock<CoreWorker>>,
    in_flight: &Arc<Mutex<HashMap<Uuid, InFlight>>>,
) {
    let now = deps.clock.now();
    let mem_used_bytes = deps.probe.sample();
    state.write().heartbeat(now, mem_used_bytes);

    let job_ids: Vec<Uuid> = in_flight.lock().keys().copied().collect();
    for job_id in job_ids {
        let update = JobUpdate {
            last_heartbeat: Some(Some(now)),
            ..Default::default()
        };
        if let Err(err) = deps.store.update_job(job_id, update).await {
            tracing::warn!(target: TRACING_TARGET_WORKER, %err, %job_id, "failed to refresh job heartbeat");
        }
    }

    let (lane, status) = {
        let guard = state.read();
        (guard.lane, guard.status)
    };
    if let Err(err) = deps
        .store
        .append_worker_metric(WorkerMetric {
            worker_id,
            lane,
            status,
            recorded_at: now,
            mem_used_bytes,
        })
        .await
    {
        tracing::warn!(target: TRACING_TARGET_WORKER, %err, %worker_id, "failed to append worker metric");
    }
}

/// Releases and requeues every job still in flight after a forced abort
/// (§4.3 Termination: killed after grace expiry, requeued with an attempt
/// increment).
async fn force_recover_survivors(
    deps: &WorkerDeps,
    in_flight: &Arc<Mutex<HashMap<Uuid, InFlight>>>,
) {
    let survivors: Vec<InFlight> = in_flight.lock().drain().map(|(_, v)| v).collect();
    let now = deps.clock.now();
    for survivor in survivors {
        deps.gate.release(survivor.ticket);
        let requeued = deps.pqm.requeue(survivor.job, now, true);
        let became_failed = requeued.state == JobState::Failed;
        persist(deps, &requeued).await;
        if became_failed {
            deps.events
                .emit(Event::JobFailed {
                    job_id: requeued.job_id,
                    reason: requeued.last_error.clone().unwrap_or_default(),
                    at: now,
                })
                .await;
        }
    }
}

fn elapsed_ms(start: Timestamp, end: Timestamp) -> f64 {
    end.duration_since(start).as_millis() as f64
}

/// A page-budget heuristic for quota deduction: one page per started
/// megabyte, at least one page. Exact page accounting depends on document
/// format and is the quota provider's concern, not the worker's; this is
/// the size-based estimate the worker is in a position to offer.
fn pages_for(file_size_bytes: u64) -> u32 {
    let mb = file_size_bytes.div_ceil(1_000_000).max(1);
    mb.min(u32::MAX as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_core::job::TenantPlan;
    use forge_core::quota::QuotaSnapshot;
    use forge_queue::LaneCaps;
    use forge_resource::ResourceConfig;
    use forge_test::clock::FakeClock;
    use forge_test::events::RecordingEventSink;
    use forge_test::process::{Script, ScriptedProcess};
    use forge_test::quota::InMemoryQuota;
    use forge_test::store::InMemoryStore;
    use std::time::Duration;

    fn test_deps(clock: Arc<FakeClock>, process: Arc<ScriptedProcess>) -> (WorkerDeps, Arc<RecordingEventSink>, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let events = Arc::new(RecordingEventSink::new());
        let pqm = Arc::new(PriorityQueueManager::new(store.clone(), LaneCaps::default()));
        let gate = Arc::new(Gate::new(ResourceConfig::default()));
        let quota = Arc::new(InMemoryQuota::new());

        let deps = WorkerDeps {
            pqm,
            gate,
            store: store.clone(),
            events: events.clone(),
            process,
            quota,
            clock,
            probe: Arc::new(crate::probe::NullMemoryProbe),
        };
        (deps, events, store)
    }

    async fn submit_job(deps: &WorkerDeps, clock: &FakeClock) -> Job {
        let job = Job::submit(
            Uuid::new_v4(),
            "s3://bucket/key",
            1_000,
            TenantPlan::Free,
            clock.now(),
            50_000_000,
            forge_core::job::DEFAULT_MAX_ATTEMPTS,
        );
        deps.store.insert_job(&job).await.unwrap();
        deps.pqm.submit(job.clone()).unwrap();
        job
    }

    #[tokio::test(start_paused = true)]
    async fn claims_processes_and_completes_a_job() {
        let clock = Arc::new(FakeClock::new(Timestamp::now()));
        let process = Arc::new(ScriptedProcess::always_succeed());
        let (deps, events, store) = test_deps(clock.clone(), process);
        let job = submit_job(&deps, &clock).await;

        let config = WorkerConfig {
            poll_interval_ms: 10,
            heartbeat_interval_ms: 60_000,
            grace_shutdown_ms: 5_000,
        };
        let (handle, join) = spawn(job.lane, deps, config);

        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.terminate().await;
        let _ = tokio::time::timeout(Duration::from_secs(5), join).await;

        let stored = store.get_job(job.job_id).await.unwrap().unwrap();
        assert_eq!(stored.state, JobState::Completed);
        assert!(
            events
                .events()
                .iter()
                .any(|e| matches!(e, Event::JobCompleted { job_id, .. } if *job_id == job.job_id))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failure_requeues_with_attempt_increment() {
        let clock = Arc::new(FakeClock::new(Timestamp::now()));
        let process = Arc::new(ScriptedProcess::new(vec![Script::Fail("boom".into())]));
        let (deps, _events, store) = test_deps(clock.clone(), process);
        let job = submit_job(&deps, &clock).await;

        let config = WorkerConfig {
            poll_interval_ms: 10,
            heartbeat_interval_ms: 60_000,
            grace_shutdown_ms: 5_000,
        };
        let (handle, join) = spawn(job.lane, deps, config);

        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.terminate().await;
        let _ = tokio::time::timeout(Duration::from_secs(5), join).await;

        let stored = store.get_job(job.job_id).await.unwrap().unwrap();
        assert_eq!(stored.state, JobState::Queued);
        assert_eq!(stored.attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn worker_local_failure_marks_job_lost_and_worker_in_error() {
        let clock = Arc::new(FakeClock::new(Timestamp::now()));
        let process = Arc::new(ScriptedProcess::new(vec![Script::FailWorkerLocal(
            "oom".into(),
        )]));
        let (deps, _events, store) = test_deps(clock.clone(), process);
        let job = submit_job(&deps, &clock).await;

        let config = WorkerConfig {
            poll_interval_ms: 10,
            heartbeat_interval_ms: 60_000,
            grace_shutdown_ms: 5_000,
        };
        let (handle, join) = spawn(job.lane, deps, config);

        tokio::time::sleep(Duration::from_millis(50)).await;

        let stored = store.get_job(job.job_id).await.unwrap().unwrap();
        assert_eq!(stored.state, JobState::LostWorker);
        assert_eq!(handle.snapshot().status, forge_core::worker::WorkerStatus::Error);

        handle.terminate().await;
        let _ = tokio::time::timeout(Duration::from_secs(5), join).await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_requeues_a_cancelled_job_without_attempt_penalty() {
        let clock = Arc::new(FakeClock::new(Timestamp::now()));
        let process = Arc::new(ScriptedProcess::new(vec![Script::HangUntilCancelled]));
        let (deps, _events, store) = test_deps(clock.clone(), process);
        let job = submit_job(&deps, &clock).await;

        let config = WorkerConfig {
            poll_interval_ms: 10,
            heartbeat_interval_ms: 60_000,
            grace_shutdown_ms: 5_000,
        };
        let (handle, join) = spawn(job.lane, deps, config);

        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.terminate().await;
        let _ = tokio::time::timeout(Duration::from_secs(5), join).await;

        let stored = store.get_job(job.job_id).await.unwrap().unwrap();
        assert_eq!(stored.state, JobState::Queued);
        assert_eq!(stored.attempts, 0);
    }

    #[test]
    fn pages_for_rounds_up_to_whole_megabytes() {
        assert_eq!(pages_for(500_000), 1);
        assert_eq!(pages_for(1_000_000), 1);
        assert_eq!(pages_for(1_000_001), 2);
    }

    #[allow(dead_code)]
    fn use_quota_snapshot(_: QuotaSnapshot) {}
}
