#![forbid(unsafe_code)]

//! The Worker: claims jobs from its lane, runs them against the pluggable
//! `Process` collaborator, and reduces every outcome to the §7
//! classification without the control plane re-deriving it (component C6,
//! §4.3).

pub mod config;
pub mod error;
pub mod probe;
pub mod runtime;

pub use config::WorkerConfig;
pub use error::Error;
pub use probe::{MemoryProbe, NullMemoryProbe};
pub use runtime::{WorkerCommand, WorkerDeps, WorkerHandle, spawn};
