//! The full enumerated configuration surface (§4.8), aggregating every
//! sub-crate's own config struct rather than re-declaring their fields.

use forge_autoscale::AutoscaleConfig;
use forge_health::HealthConfig;
use forge_resource::ResourceConfig;
use forge_worker::WorkerConfig;

/// Everything `Start`/`UpdateConfig` accept (§4.8). Composition mirrors
/// the crate layout: each nested struct owns the fields its component
/// actually reads, and `FabricConfig` only adds the one field —
/// `max_attempts` — that belongs to the job record itself rather than any
/// one component.
#[cfg_attr(feature = "config", derive(clap::Args))]
#[derive(Debug, Clone, Copy)]
pub struct FabricConfig {
    #[cfg_attr(feature = "config", command(flatten))]
    pub autoscale: AutoscaleConfig,

    #[cfg_attr(feature = "config", command(flatten))]
    pub health: HealthConfig,

    #[cfg_attr(feature = "config", command(flatten))]
    pub resource: ResourceConfig,

    #[cfg_attr(feature = "config", command(flatten))]
    pub worker: WorkerConfig,

    /// Retry budget for a job before it is marked `Failed` permanently
    /// (§4.1 `Requeue`).
    #[cfg_attr(
        feature = "config",
        arg(long, env = "FORGE_MAX_ATTEMPTS", default_value_t = default_max_attempts())
    )]
    pub max_attempts: u32,
}

pub const fn default_max_attempts() -> u32 {
    forge_core::job::DEFAULT_MAX_ATTEMPTS
}

impl Default for FabricConfig {
    fn default() -> Self {
        Self {
            autoscale: AutoscaleConfig::default(),
            health: HealthConfig::default(),
            resource: ResourceConfig::default(),
            worker: WorkerConfig::default(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl FabricConfig {
    /// Cross-component validation (§4.8 `UpdateConfig`: "`min_workers >
    /// max_workers` is rejected"). Each sub-config validates its own
    /// bounds first.
    pub fn validate(&self) -> Result<(), String> {
        self.autoscale.validate()?;
        self.health.validate()?;
        self.resource.validate()?;
        if self.max_attempts == 0 {
            return Err("max_attempts must be greater than zero".to_string());
        }
        Ok(())
    }
}
