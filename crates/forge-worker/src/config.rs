//! Worker timing configuration (§4.3).

#[cfg_attr(feature = "config", derive(clap::Args))]
#[derive(Debug, Clone, Copy)]
pub struct WorkerConfig {
    /// How often an idle worker polls its lane for the next job.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "FORGE_WORKER_POLL_INTERVAL_MS", default_value_t = default_poll_interval_ms())
    )]
    pub poll_interval_ms: u64,

    /// How often a worker refreshes `last_heartbeat` for itself and every
    /// job it is currently running (§4.5 staleness threshold depends on
    /// this cadence).
    #[cfg_attr(
        feature = "config",
        arg(long, env = "FORGE_WORKER_HEARTBEAT_INTERVAL_MS", default_value_t = default_heartbeat_interval_ms())
    )]
    pub heartbeat_interval_ms: u64,

    /// How long `Terminate` waits for in-flight jobs to finish naturally
    /// before the worker aborts them and requeues with an attempt
    /// increment (§4.3 Termination).
    #[cfg_attr(
        feature = "config",
        arg(long, env = "FORGE_WORKER_GRACE_SHUTDOWN_MS", default_value_t = default_grace_shutdown_ms())
    )]
    pub grace_shutdown_ms: u64,
}

pub const fn default_poll_interval_ms() -> u64 {
    500
}

pub const fn default_heartbeat_interval_ms() -> u64 {
    20_000
}

pub const fn default_grace_shutdown_ms() -> u64 {
    30_000
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            grace_shutdown_ms: default_grace_shutdown_ms(),
        }
    }
}

impl WorkerConfig {
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.poll_interval_ms)
    }

    pub fn heartbeat_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn grace_shutdown(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.grace_shutdown_ms)
    }
}
