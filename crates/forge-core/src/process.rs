//! The pluggable `Process` collaborator (§1, §6): the actual
//! document-parsing algorithm is out of scope for this crate family, but
//! the contract the worker invokes it through is not.

use tokio_util::sync::CancellationToken;

use crate::error::ErrorClass;
use crate::job::Job;

/// The outcome of invoking `Process` for one job.
#[derive(Debug)]
pub enum ProcessOutcome {
    /// `Process` completed; `result_ref` is an opaque blob the Store
    /// persists (§6).
    Success { result_ref: String },
    /// `Process` failed. `class` is the §7 error taxonomy kind the
    /// implementation assigns to `error`; the worker reduces it to
    /// Requeue / Fail / LostWorker without re-deriving the policy (§7
    /// Propagation: "errors inside `Process` never reach control loops
    /// directly; they are classified by the worker").
    Failure {
        error: Box<dyn std::error::Error + Send + Sync>,
        class: ErrorClass,
    },
}

/// Pluggable document-processing function. Implementations must be
/// re-entrant with respect to cancellation: on cancellation they should
/// return promptly, and any partial side effects must be idempotent on
/// retry (§5 Cancellation semantics).
///
/// `Process` always runs outside every control-plane lock (§5
/// Shared-resource policy) — implementations do their own I/O freely.
#[async_trait::async_trait]
pub trait Process: Send + Sync {
    async fn process(&self, cancel: CancellationToken, job: &Job) -> ProcessOutcome;
}
