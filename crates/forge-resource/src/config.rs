//! Resource admission configuration (§4.8 enumerated options, the subset
//! owned by the gate).

#[cfg_attr(feature = "config", derive(clap::Args))]
#[derive(Debug, Clone, Copy)]
pub struct ResourceConfig {
    #[cfg_attr(
        feature = "config",
        arg(long, env = "FORGE_MAX_CONCURRENT", default_value_t = default_max_concurrent())
    )]
    pub max_concurrent: u32,

    #[cfg_attr(
        feature = "config",
        arg(long, env = "FORGE_MEM_CEILING_BYTES", default_value_t = default_mem_ceiling_bytes())
    )]
    pub mem_ceiling_bytes: u64,

    #[cfg_attr(
        feature = "config",
        arg(long, env = "FORGE_MEM_PAUSE_PCT", default_value_t = default_mem_pause_pct())
    )]
    pub mem_pause_pct: f64,

    #[cfg_attr(
        feature = "config",
        arg(long, env = "FORGE_MEM_RESUME_PCT", default_value_t = default_mem_resume_pct())
    )]
    pub mem_resume_pct: f64,

    #[cfg_attr(
        feature = "config",
        arg(long, env = "FORGE_LARGE_THRESHOLD_BYTES", default_value_t = default_large_threshold_bytes())
    )]
    pub large_threshold_bytes: u64,

    #[cfg_attr(
        feature = "config",
        arg(long, env = "FORGE_MAX_LARGE_CONCURRENT", default_value_t = default_max_large_concurrent())
    )]
    pub max_large_concurrent: u32,
}

pub const fn default_max_concurrent() -> u32 {
    10
}

pub const fn default_mem_ceiling_bytes() -> u64 {
    2 * 1024 * 1024 * 1024
}

pub const fn default_mem_pause_pct() -> f64 {
    0.85
}

pub const fn default_mem_resume_pct() -> f64 {
    0.70
}

pub const fn default_large_threshold_bytes() -> u64 {
    50 * 1024 * 1024
}

pub const fn default_max_large_concurrent() -> u32 {
    1
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            mem_ceiling_bytes: default_mem_ceiling_bytes(),
            mem_pause_pct: default_mem_pause_pct(),
            mem_resume_pct: default_mem_resume_pct(),
            large_threshold_bytes: default_large_threshold_bytes(),
            max_large_concurrent: default_max_large_concurrent(),
        }
    }
}

impl ResourceConfig {
    /// Bounds validation returns a `Configuration`-classified rejection
    /// (§7); `UpdateConfig` keeps the prior config in force on failure.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.mem_pause_pct) {
            return Err("mem_pause_pct must be between 0.0 and 1.0".to_string());
        }
        if !(0.0..=1.0).contains(&self.mem_resume_pct) {
            return Err("mem_resume_pct must be between 0.0 and 1.0".to_string());
        }
        if self.mem_resume_pct >= self.mem_pause_pct {
            return Err("mem_resume_pct must be lower than mem_pause_pct".to_string());
        }
        Ok(())
    }
}
