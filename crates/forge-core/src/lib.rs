#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Shared domain types, external-collaborator traits, and the error
//! taxonomy for the job execution fabric.
//!
//! Every other `forge-*` crate depends on this one and nothing else in the
//! workspace depends on them, mirroring how `nvisy-core` sits at the base
//! of the `nvisy-*` crate family.

pub mod clock;
pub mod error;
pub mod events;
pub mod job;
pub mod ledger;
pub mod process;
pub mod quota;
pub mod store;
pub mod worker;

pub use clock::Clock;
pub use error::{Error, ErrorClass, Result};
pub use events::{Event, EventSink};
pub use job::{Job, JobState, Lane, TenantPlan};
pub use ledger::ResourceLedger;
pub use process::{Process, ProcessOutcome};
pub use quota::{QuotaSnapshot, TenantQuota};
pub use store::{QueueStat, Store, WorkerMetric};
pub use worker::{Worker, WorkerStatus};
