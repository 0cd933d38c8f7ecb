#![forbid(unsafe_code)]

//! Cluster Controller (component C10, §4.8): the sole public entry point
//! into the job execution fabric. Owns the live worker set, wires the
//! health monitor, lost-job recovery, backpressure sampling, and
//! autoscaler into periodic background loops, and exposes
//! `Start`/`Submit`/`Status`/`Scale`/`UpdateConfig`/`Shutdown`.

mod config;
mod controller;
mod error;
mod registry;
mod view;

pub use config::FabricConfig;
pub use controller::{ClusterController, ControllerDeps, ShutdownReport};
pub use error::{Error, Result};
pub use registry::WorkerSet;
pub use view::{ClusterView, JobView, LaneView};
