//! Autoscaler timing and bounds configuration (§4.7, §4.8).

#[cfg_attr(feature = "config", derive(clap::Args))]
#[derive(Debug, Clone, Copy)]
pub struct AutoscaleConfig {
    /// Floor on total worker count across all lanes.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "FORGE_MIN_WORKERS", default_value_t = default_min_workers())
    )]
    pub min_workers: u32,

    /// Ceiling on total worker count across all lanes.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "FORGE_MAX_WORKERS", default_value_t = default_max_workers())
    )]
    pub max_workers: u32,

    /// Total waiting above this triggers scale-up (§4.7 rule 2).
    #[cfg_attr(
        feature = "config",
        arg(long, env = "FORGE_SCALE_UP_THRESHOLD", default_value_t = default_scale_up_threshold())
    )]
    pub scale_up_threshold: u32,

    /// Total waiting below this triggers scale-down (§4.7 rule 3).
    #[cfg_attr(
        feature = "config",
        arg(long, env = "FORGE_SCALE_DOWN_THRESHOLD", default_value_t = default_scale_down_threshold())
    )]
    pub scale_down_threshold: u32,

    /// Minimum gap between two scaling actions (§4.7 rule 1).
    #[cfg_attr(
        feature = "config",
        arg(long, env = "FORGE_SCALE_DEBOUNCE_MS", default_value_t = default_scale_debounce_ms())
    )]
    pub scale_debounce_ms: u64,

    /// How often the reconciler runs.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "FORGE_SCALE_CHECK_INTERVAL_MS", default_value_t = default_scale_check_interval_ms())
    )]
    pub scale_check_interval_ms: u64,

    /// A floor reserved for the Normal lane so sustained Premium load
    /// cannot starve it down to zero workers.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "FORGE_NORMAL_WORKER_FLOOR", default_value_t = default_normal_worker_floor())
    )]
    pub normal_worker_floor: u32,
}

pub const fn default_min_workers() -> u32 {
    5
}

pub const fn default_max_workers() -> u32 {
    15
}

pub const fn default_scale_up_threshold() -> u32 {
    10
}

pub const fn default_scale_down_threshold() -> u32 {
    3
}

pub const fn default_scale_debounce_ms() -> u64 {
    10_000
}

pub const fn default_scale_check_interval_ms() -> u64 {
    15_000
}

pub const fn default_normal_worker_floor() -> u32 {
    1
}

impl Default for AutoscaleConfig {
    fn default() -> Self {
        Self {
            min_workers: default_min_workers(),
            max_workers: default_max_workers(),
            scale_up_threshold: default_scale_up_threshold(),
            scale_down_threshold: default_scale_down_threshold(),
            scale_debounce_ms: default_scale_debounce_ms(),
            scale_check_interval_ms: default_scale_check_interval_ms(),
            normal_worker_floor: default_normal_worker_floor(),
        }
    }
}

impl AutoscaleConfig {
    pub fn scale_debounce(&self) -> jiff::SignedDuration {
        jiff::SignedDuration::from_millis(self.scale_debounce_ms as i64)
    }

    pub fn scale_check_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.scale_check_interval_ms)
    }

    /// Bounds validation (§7 Configuration errors / §4.8 `UpdateConfig`):
    /// an inverted range can never be satisfied by any worker count.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_workers > self.max_workers {
            return Err("min_workers must not exceed max_workers".to_string());
        }
        if self.scale_check_interval_ms == 0 {
            return Err("scale_check_interval_ms must be greater than zero".to_string());
        }
        if self.normal_worker_floor > self.min_workers {
            return Err("normal_worker_floor must not exceed min_workers".to_string());
        }
        Ok(())
    }
}
