//! Event Sink external collaborator (component C2, §6).

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::job::Lane;

/// Structured events the fabric emits. Delivery is best-effort and must
/// never block the control plane (§6) — concrete sinks (`forge-nats`) log
/// and swallow publish failures rather than propagating them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    JobSubmitted {
        job_id: Uuid,
        tenant_id: Uuid,
        lane: Lane,
        at: Timestamp,
    },
    JobCompleted {
        job_id: Uuid,
        worker_id: Uuid,
        at: Timestamp,
    },
    JobFailed {
        job_id: Uuid,
        reason: String,
        at: Timestamp,
    },
    WorkerReplaced {
        old_worker_id: Uuid,
        new_worker_id: Uuid,
        lane: Lane,
        reason: String,
        at: Timestamp,
    },
    ClusterPaused {
        mem_pct: f64,
        at: Timestamp,
    },
    ClusterResumed {
        mem_pct: f64,
        at: Timestamp,
    },
    /// Emitted when `UpdateConfig` is rejected, giving operators an audit
    /// trail beyond the returned error (§10.9 supplement).
    ConfigRejected {
        reason: String,
        at: Timestamp,
    },
}

/// Fire-and-forget structured event publisher.
#[async_trait::async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: Event);
}

/// An `EventSink` that drops every event. Useful as a default when no
/// concrete sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventSink;

#[async_trait::async_trait]
impl EventSink for NullEventSink {
    async fn emit(&self, _event: Event) {}
}
