//! End-to-end test of the four Control API endpoints over a
//! `ClusterController` wired entirely to in-memory doubles (§6, §8
//! scenario 1-style smoke test).

use std::sync::Arc;
use std::time::Duration;

use axum_test::TestServer;
use forge_controller::{ClusterController, ControllerDeps, FabricConfig};
use forge_core::job::TenantPlan;
use forge_server::{ScaleRequest, ServerState, SubmitResponse, router};
use forge_test::{FakeClock, InMemoryQuota, InMemoryStore, RecordingEventSink, ScriptedProcess};
use forge_worker::NullMemoryProbe;
use serde_json::json;

async fn test_server() -> TestServer {
    let deps = ControllerDeps {
        store: Arc::new(InMemoryStore::new()),
        events: Arc::new(RecordingEventSink::new()),
        process: Arc::new(ScriptedProcess::always_succeed()),
        quota: Arc::new(InMemoryQuota::new()),
        clock: Arc::new(FakeClock::new(jiff::Timestamp::now())),
        probe: Arc::new(NullMemoryProbe),
    };

    let config = FabricConfig {
        autoscale: forge_autoscale::AutoscaleConfig { min_workers: 1, max_workers: 3, ..Default::default() },
        ..Default::default()
    };

    let controller = ClusterController::start(deps, config).await.unwrap();
    let state = ServerState::new(controller);
    TestServer::new(router(state)).unwrap()
}

#[tokio::test]
async fn submit_then_status_round_trips() {
    let server = test_server().await;

    let response = server
        .post("/submit")
        .json(&json!({
            "tenant_id": uuid::Uuid::new_v4(),
            "file_ref": "s3://bucket/doc.pdf",
            "file_size_bytes": 1_000_000,
            "tenant_plan": "pro",
        }))
        .await;
    response.assert_status(axum::http::StatusCode::ACCEPTED);
    let body: SubmitResponse = response.json();

    let status = server.get(&format!("/status/{}", body.job_id)).await;
    status.assert_status_ok();
}

#[tokio::test]
async fn status_for_unknown_job_is_404() {
    let server = test_server().await;
    let response = server.get(&format!("/status/{}", uuid::Uuid::new_v4())).await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn cluster_reports_initial_worker_count() {
    let server = test_server().await;
    let response = server.get("/cluster").await;
    response.assert_status_ok();
    let view: forge_controller::ClusterView = response.json();
    let total_workers: u32 = view.lanes.iter().map(|l| l.workers).sum();
    assert_eq!(total_workers, 1);
}

#[tokio::test]
async fn scale_bounded_by_max_workers_is_rejected() {
    let server = test_server().await;
    let response = server
        .post("/scale")
        .json(&ScaleRequest {
            targets: vec![forge_server::LaneTarget { lane: forge_core::job::Lane::Premium, target: 10 }],
        })
        .await;
    response.assert_status_bad_request();
    tokio::time::sleep(Duration::from_millis(1)).await;
}
