#![forbid(unsafe_code)]

//! Resource Admission Gate: enforces the concurrency and memory ceilings
//! and the large-file sub-budget, and owns the pause/resume backpressure
//! rule (§4.2).

pub mod config;
pub mod error;
pub mod estimate;
pub mod gate;

pub use config::ResourceConfig;
pub use error::Error;
pub use estimate::{DefaultEstimator, Estimator};
pub use gate::{Gate, Ticket, backpressure_retry_delay};
