#![forbid(unsafe_code)]

//! Load Balancer (component C8, §4.6): a pure advisor with no side
//! effects. It reads a point-in-time view of queue depth, worker
//! utilization, and resource saturation and returns one
//! [`Recommendation`] per cycle for the autoscaler to weigh alongside its
//! own debounced rules (§4.7).

mod recommend;
mod snapshot;

pub use recommend::{LoadBalancer, Recommendation};
pub use snapshot::{ClusterSnapshot, LaneWorkerSnapshot};
