//! Health monitor timing configuration (§4.4, §4.5, §4.8).

#[cfg_attr(feature = "config", derive(clap::Args))]
#[derive(Debug, Clone, Copy)]
pub struct HealthConfig {
    /// How often the health monitor scans the worker registry.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "FORGE_HEALTH_CHECK_INTERVAL_MS", default_value_t = default_health_check_interval_ms())
    )]
    pub health_check_interval_ms: u64,

    /// Absence of a heartbeat beyond this threshold marks a worker `Stalled`
    /// (§4.4).
    #[cfg_attr(
        feature = "config",
        arg(long, env = "FORGE_STALL_THRESHOLD_MS", default_value_t = default_stall_threshold_ms())
    )]
    pub stall_threshold_ms: u64,

    /// Consecutive `Error` observations before a worker is replaced (§4.4).
    #[cfg_attr(
        feature = "config",
        arg(long, env = "FORGE_MAX_CONSECUTIVE_FAILURES", default_value_t = default_max_consecutive_failures())
    )]
    pub max_consecutive_failures: u32,

    /// Per-worker memory ceiling; exceeding it replaces the worker
    /// regardless of heartbeat or error state (§4.4).
    #[cfg_attr(
        feature = "config",
        arg(long, env = "FORGE_WORKER_MEM_CEILING_BYTES", default_value_t = default_worker_mem_ceiling_bytes())
    )]
    pub worker_mem_ceiling_bytes: u64,

    /// A `Running`/`LostWorker` job whose heartbeat is older than this is a
    /// recovery candidate (§4.5).
    #[cfg_attr(
        feature = "config",
        arg(long, env = "FORGE_RECOVERY_THRESHOLD_MS", default_value_t = default_recovery_threshold_ms())
    )]
    pub recovery_threshold_ms: u64,
}

pub const fn default_health_check_interval_ms() -> u64 {
    30_000
}

pub const fn default_stall_threshold_ms() -> u64 {
    60_000
}

pub const fn default_max_consecutive_failures() -> u32 {
    3
}

pub const fn default_worker_mem_ceiling_bytes() -> u64 {
    2 * 1024 * 1024 * 1024
}

pub const fn default_recovery_threshold_ms() -> u64 {
    90_000
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            health_check_interval_ms: default_health_check_interval_ms(),
            stall_threshold_ms: default_stall_threshold_ms(),
            max_consecutive_failures: default_max_consecutive_failures(),
            worker_mem_ceiling_bytes: default_worker_mem_ceiling_bytes(),
            recovery_threshold_ms: default_recovery_threshold_ms(),
        }
    }
}

impl HealthConfig {
    pub fn health_check_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.health_check_interval_ms)
    }

    pub fn stall_threshold(&self) -> jiff::SignedDuration {
        jiff::SignedDuration::from_millis(self.stall_threshold_ms as i64)
    }

    pub fn recovery_threshold(&self) -> jiff::SignedDuration {
        jiff::SignedDuration::from_millis(self.recovery_threshold_ms as i64)
    }

    /// Bounds validation (§7 Configuration errors): a zero interval would
    /// busy-loop the monitor, and a recovery threshold shorter than the
    /// stall threshold would recover jobs before their worker is even
    /// declared stalled.
    pub fn validate(&self) -> Result<(), String> {
        if self.health_check_interval_ms == 0 {
            return Err("health_check_interval_ms must be greater than zero".to_string());
        }
        if self.recovery_threshold_ms < self.stall_threshold_ms {
            return Err(
                "recovery_threshold_ms must be at least stall_threshold_ms".to_string(),
            );
        }
        Ok(())
    }
}
