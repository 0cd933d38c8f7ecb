#![forbid(unsafe_code)]

//! Priority Queue Manager: lane selection lives in `forge_core::job::Lane`;
//! this crate owns intra-lane ordering, `Submit`/`Claim`/`Requeue`/`Stats`,
//! and durable waiting-set reconstruction (§4.1).

mod error;
mod manager;
mod waiting;

pub use error::{Error, Result};
pub use manager::{LaneCaps, LaneStats, PriorityQueueManager};
