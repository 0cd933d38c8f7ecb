//! Admission rejection reasons (§4.2).

use forge_core::error::{Classify, ErrorClass};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Why `Acquire` rejected a job. None of these are retried immediately —
/// the worker yields and re-checks after a jittered delay (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("at max concurrent job ceiling")]
    AtConcurrencyCeiling,
    #[error("cluster is paused for backpressure")]
    Paused,
    #[error("at max large-file concurrency ceiling")]
    AtLargeConcurrencyCeiling,
    #[error("admitting this job would exceed the memory ceiling")]
    AtMemoryCeiling,
}

impl Classify for Error {
    fn classify(&self) -> ErrorClass {
        // Every rejection is backpressure: the worker requeues without
        // incrementing attempts (§7 Transient, "unless it was backpressure").
        ErrorClass::Transient
    }
}
