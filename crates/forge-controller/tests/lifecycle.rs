//! Integration tests of the Cluster Controller's public contract (§4.8)
//! against in-memory doubles, covering §8 invariants 3, 6, 7 and the
//! insufficient-pages / graceful-shutdown scenarios.

use std::sync::Arc;
use std::time::Duration;

use forge_controller::{ClusterController, ControllerDeps, FabricConfig};
use forge_core::job::{JobState, TenantPlan};
use forge_core::store::Store;
use forge_test::{FakeClock, InMemoryQuota, InMemoryStore, RecordingEventSink, ScriptedProcess};
use forge_worker::NullMemoryProbe;

fn deps_with(process: ScriptedProcess, quota: InMemoryQuota) -> ControllerDeps {
    ControllerDeps {
        store: Arc::new(InMemoryStore::new()),
        events: Arc::new(RecordingEventSink::new()),
        process: Arc::new(process),
        quota: Arc::new(quota),
        clock: Arc::new(FakeClock::new(jiff::Timestamp::now())),
        probe: Arc::new(NullMemoryProbe),
    }
}

fn small_config() -> FabricConfig {
    FabricConfig {
        autoscale: forge_autoscale::AutoscaleConfig { min_workers: 2, max_workers: 4, ..Default::default() },
        ..Default::default()
    }
}

#[tokio::test]
async fn start_spawns_min_workers_within_bounds() {
    let deps = deps_with(ScriptedProcess::always_succeed(), InMemoryQuota::new());
    let controller = ClusterController::start(deps, small_config()).await.unwrap();

    let view = controller.cluster_view();
    let total: u32 = view.lanes.iter().map(|l| l.workers).sum();
    assert_eq!(total, 2, "Start must create exactly min_workers (§8 invariant 6)");
    assert!(!view.paused);
}

#[tokio::test]
async fn submit_then_status_reports_completion() {
    let deps = deps_with(ScriptedProcess::always_succeed(), InMemoryQuota::new());
    let controller = ClusterController::start(deps, small_config()).await.unwrap();

    let job_id = controller
        .submit(uuid::Uuid::new_v4(), "s3://bucket/a.pdf", 1_000_000, TenantPlan::Pro)
        .await
        .unwrap();

    let mut view = controller.status(job_id).await.unwrap();
    for _ in 0..200 {
        if matches!(view.as_ref().map(|v| v.state), Some(JobState::Completed)) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        view = controller.status(job_id).await.unwrap();
    }
    assert_eq!(view.unwrap().state, JobState::Completed);
}

#[tokio::test]
async fn submit_rejected_when_quota_exhausted() {
    let quota = InMemoryQuota::new();
    let tenant = uuid::Uuid::new_v4();
    quota.set_remaining(tenant, 0);
    quota.set_unlimited(tenant, false);
    let deps = deps_with(ScriptedProcess::always_succeed(), quota);
    let controller = ClusterController::start(deps, small_config()).await.unwrap();

    let result = controller.submit(tenant, "s3://bucket/a.pdf", 1_000, TenantPlan::Free).await;
    assert!(result.is_err(), "zero remaining pages must reject Submit with InsufficientPages (§8 boundary)");
}

#[tokio::test]
async fn shutdown_stops_accepting_new_submits() {
    let deps = deps_with(ScriptedProcess::always_succeed(), InMemoryQuota::new());
    let controller = ClusterController::start(deps, small_config()).await.unwrap();

    let report = controller.shutdown(Duration::from_secs(1)).await;
    assert_eq!(report.workers_terminated, 2);

    let result = controller.submit(uuid::Uuid::new_v4(), "s3://bucket/a.pdf", 1_000, TenantPlan::Free).await;
    assert!(result.is_err(), "no Submit may be accepted once Shutdown has been called");
}

#[tokio::test]
async fn scale_request_outside_bounds_is_rejected() {
    let deps = deps_with(ScriptedProcess::always_succeed(), InMemoryQuota::new());
    let controller = ClusterController::start(deps, small_config()).await.unwrap();

    let result = controller.scale(&[(forge_core::job::Lane::Premium, 99)]).await;
    assert!(result.is_err(), "scale target above max_workers must be rejected (§4.7 Safety)");

    let view = controller.cluster_view();
    let total: u32 = view.lanes.iter().map(|l| l.workers).sum();
    assert_eq!(total, 2, "a rejected scale request must not change worker count");
}

#[tokio::test]
async fn update_config_rejects_inverted_bounds() {
    let deps = deps_with(ScriptedProcess::always_succeed(), InMemoryQuota::new());
    let controller = ClusterController::start(deps, small_config()).await.unwrap();

    let mut bad = small_config();
    bad.autoscale.min_workers = 10;
    bad.autoscale.max_workers = 2;

    let result = controller.update_config(bad).await;
    assert!(result.is_err(), "min_workers > max_workers must be rejected (§4.8 UpdateConfig)");
}
