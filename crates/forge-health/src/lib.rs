#![forbid(unsafe_code)]

//! Health Monitor: stall/error/memory-runaway detection and worker
//! replacement, plus lost-job recovery bookkeeping (component C7, §4.4,
//! §4.5).

pub mod config;
pub mod error;
pub mod monitor;
pub mod recovery;

pub use config::HealthConfig;
pub use error::Error;
pub use monitor::{HealthMonitor, ReplaceReason, WorkerRegistry, WorkerSnapshot};
pub use recovery::{recover_lost_jobs, RecoverySummary};
