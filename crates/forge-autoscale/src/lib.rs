#![forbid(unsafe_code)]

//! Autoscaler (component C9, §4.7): a debounced periodic reconciler that
//! turns queue backlog, the [`forge_balancer`] recommendation, and the
//! current worker distribution into a target worker count per lane for
//! the Cluster Controller to apply.

mod config;
mod engine;
mod error;
mod plan;

pub use config::AutoscaleConfig;
pub use engine::Autoscaler;
pub use error::Error;
pub use plan::{LaneTarget, ScalePlan};
