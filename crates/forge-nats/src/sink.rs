//! `forge_core::events::EventSink` implementation over NATS JetStream
//! (§6 Event Sink: "delivery is best-effort; must not block the control
//! plane"). Every publish failure is logged and swallowed — the trait
//! returns nothing to propagate to begin with, matching `nvisy-nats`'s
//! fire-and-forget `EventPublisher::publish` except that failures here
//! never reach the caller at all.

use forge_core::events::{Event, EventSink};

use crate::client::NatsClient;
use crate::config::SUBJECT_PREFIX;

#[derive(Debug, Clone)]
pub struct NatsEventSink {
    client: NatsClient,
}

impl NatsEventSink {
    pub fn new(client: NatsClient) -> Self {
        Self { client }
    }

    fn subject(event: &Event) -> &'static str {
        match event {
            Event::JobSubmitted { .. } => "job_submitted",
            Event::JobCompleted { .. } => "job_completed",
            Event::JobFailed { .. } => "job_failed",
            Event::WorkerReplaced { .. } => "worker_replaced",
            Event::ClusterPaused { .. } => "cluster_paused",
            Event::ClusterResumed { .. } => "cluster_resumed",
            Event::ConfigRejected { .. } => "config_rejected",
        }
    }
}

#[async_trait::async_trait]
impl EventSink for NatsEventSink {
    async fn emit(&self, event: Event) {
        let subject = format!("{SUBJECT_PREFIX}.{}", Self::subject(&event));
        let payload = match serde_json::to_vec(&event) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::warn!(target: "forge_nats::sink", %error, %subject, "failed to serialize event");
                return;
            }
        };

        if let Err(error) = self.client.publish(subject.clone(), payload).await {
            tracing::warn!(target: "forge_nats::sink", %error, %subject, "failed to publish event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subjects_are_stable_snake_case() {
        let now = jiff::Timestamp::now();
        assert_eq!(
            NatsEventSink::subject(&Event::ClusterPaused { mem_pct: 0.9, at: now }),
            "cluster_paused"
        );
        assert_eq!(
            NatsEventSink::subject(&Event::ConfigRejected { reason: "x".to_string(), at: now }),
            "config_rejected"
        );
    }
}
