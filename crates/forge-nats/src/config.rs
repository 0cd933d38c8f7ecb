//! Connection configuration for the NATS event sink backend (§6 Event
//! Sink). Mirrors `nvisy-nats`'s `NatsConfig` shape: a flat `clap::Args`
//! struct with `env` fallbacks, gated behind the `config` feature so a
//! caller embedding this crate as a library isn't forced to pull in clap.

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// The JetStream stream every fabric event is published to. One stream is
/// enough here — unlike `nvisy-nats`'s per-purpose streams (file jobs,
/// webhooks, ...) the control plane has a single, low-volume event
/// vocabulary (§3 Event, `Event` enum in `forge-core`).
pub const STREAM_NAME: &str = "FORGE_EVENTS";
pub const SUBJECT_PREFIX: &str = "forge.events";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct NatsConfig {
    /// NATS server URL (comma-separated for clustering).
    #[cfg_attr(
        feature = "config",
        arg(long, env = "FORGE_NATS_URL", default_value = "nats://127.0.0.1:4222")
    )]
    pub url: String,

    /// Authentication token, if the deployment requires one.
    #[cfg_attr(feature = "config", arg(long, env = "FORGE_NATS_TOKEN"))]
    pub token: Option<String>,

    /// Client connection name, surfaced in `nats server info` for debugging.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "FORGE_NATS_CLIENT_NAME", default_value = "forge-fabric")
    )]
    pub name: String,

    /// How long to wait for the initial connection before giving up.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "FORGE_NATS_CONNECT_TIMEOUT_SECS", default_value_t = default_connect_timeout_secs())
    )]
    pub connect_timeout_secs: u64,

    /// Number of days events are retained in the stream before expiring.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "FORGE_NATS_EVENT_RETENTION_DAYS", default_value_t = default_retention_days())
    )]
    pub retention_days: u64,
}

const fn default_connect_timeout_secs() -> u64 {
    10
}

const fn default_retention_days() -> u64 {
    3
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: "nats://127.0.0.1:4222".to_string(),
            token: None,
            name: "forge-fabric".to_string(),
            connect_timeout_secs: default_connect_timeout_secs(),
            retention_days: default_retention_days(),
        }
    }
}

impl NatsConfig {
    pub fn connect_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn max_age(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.retention_days * 24 * 60 * 60)
    }
}
