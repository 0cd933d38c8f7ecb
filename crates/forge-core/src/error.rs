//! Error taxonomy shared by every fabric crate.
//!
//! The taxonomy has five kinds, each carrying a fixed retry policy. Crate
//! level errors (`forge_queue::Error`, `forge_worker::Error`, ...) are free
//! to define their own variants, but each one implements [`Classify`] so the
//! worker main loop and the health monitor can reduce any error down to one
//! of these five kinds without re-deriving the policy at each call site.

use std::error::Error as StdError;

/// Result type alias used throughout this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The five error kinds named by the error handling design.
///
/// Each kind has exactly one recovery policy, enforced by the component
/// that observes it (the worker for `Transient`/`FatalToJob`/`WorkerLocal`,
/// the cluster controller for `Configuration`/`System`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Downstream timeout, I/O hiccup, admission backpressure. Requeue,
    /// incrementing `attempts` unless the cause was backpressure.
    Transient,
    /// Malformed input, insufficient quota. Mark the job `Failed`
    /// immediately; never retried.
    FatalToJob,
    /// `Process` crashed or exceeded its memory ceiling. The job becomes
    /// `LostWorker`; the health monitor replaces the worker and recovery
    /// re-queues the job.
    WorkerLocal,
    /// Invalid bounds in `UpdateConfig`. The change is rejected; the prior
    /// configuration remains in force.
    Configuration,
    /// The Store is unreachable or the clock is anomalous. Admission is
    /// paused and the condition is surfaced as a critical event.
    System,
}

impl ErrorClass {
    /// Whether an error of this class should be retried by re-queuing the
    /// job that triggered it.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Transient | Self::WorkerLocal)
    }
}

/// Implemented by every crate-level error type so the classification rule
/// lives in one place.
pub trait Classify {
    fn classify(&self) -> ErrorClass;
}

/// Generic error type for components in this crate itself (the `Clock`
/// default impl, ledger bookkeeping). Downstream crates define their own
/// richer error enums and are not required to wrap this type.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    pub kind: ErrorKind,
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    pub fn with_source(kind: ErrorKind, source: Box<dyn StdError + Send + Sync>) -> Self {
        Self {
            kind,
            source: Some(source),
        }
    }

    pub fn insufficient_pages() -> Self {
        Self::new(ErrorKind::InsufficientPages)
    }

    pub fn unknown_lane(lane: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownLane(lane.into()))
    }

    pub fn queue_full(lane: impl Into<String>) -> Self {
        Self::new(ErrorKind::QueueFull(lane.into()))
    }

    pub fn store_unreachable(source: Box<dyn StdError + Send + Sync>) -> Self {
        Self::with_source(ErrorKind::StoreUnreachable, source)
    }

    pub fn job_not_found(job_id: uuid::Uuid) -> Self {
        Self::new(ErrorKind::JobNotFound(job_id))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    #[error("tenant has insufficient pages remaining")]
    InsufficientPages,
    #[error("unknown lane: {0}")]
    UnknownLane(String),
    #[error("lane '{0}' is at capacity")]
    QueueFull(String),
    #[error("job store is unreachable")]
    StoreUnreachable,
    #[error("job {0} not found")]
    JobNotFound(uuid::Uuid),
}

impl Classify for Error {
    fn classify(&self) -> ErrorClass {
        match self.kind {
            ErrorKind::InsufficientPages => ErrorClass::FatalToJob,
            ErrorKind::UnknownLane(_) | ErrorKind::QueueFull(_) => ErrorClass::Configuration,
            ErrorKind::StoreUnreachable => ErrorClass::System,
            ErrorKind::JobNotFound(_) => ErrorClass::FatalToJob,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_pages_is_fatal_to_job() {
        assert_eq!(
            Error::insufficient_pages().classify(),
            ErrorClass::FatalToJob
        );
    }

    #[test]
    fn queue_full_is_configuration() {
        assert_eq!(Error::queue_full("large").classify(), ErrorClass::Configuration);
    }

    #[test]
    fn transient_and_worker_local_are_retryable() {
        assert!(ErrorClass::Transient.is_retryable());
        assert!(ErrorClass::WorkerLocal.is_retryable());
        assert!(!ErrorClass::FatalToJob.is_retryable());
        assert!(!ErrorClass::Configuration.is_retryable());
        assert!(!ErrorClass::System.is_retryable());
    }
}
