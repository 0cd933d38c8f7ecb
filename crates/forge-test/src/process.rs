//! Scriptable `Process` double.

use forge_core::error::ErrorClass;
use forge_core::job::Job;
use forge_core::process::{Process, ProcessOutcome};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

/// What a scripted `Process` call should do.
pub enum Script {
    Succeed,
    /// A transient failure — requeued with `attempts += 1` (§7).
    Fail(String),
    /// A fatal-to-job failure — marked `Failed` immediately, never retried.
    FailFatal(String),
    /// A crash or memory-ceiling violation — the job becomes `LostWorker`.
    FailWorkerLocal(String),
    /// Waits for the cancellation token to fire, then returns a failure —
    /// used to exercise the worker's cancellation/grace-shutdown path.
    HangUntilCancelled,
}

/// A `Process` whose behavior per call is scripted in advance, in FIFO
/// order; once the script is exhausted it repeats its last entry.
pub struct ScriptedProcess {
    script: Mutex<Vec<Script>>,
    call_count: Mutex<u32>,
}

impl ScriptedProcess {
    pub fn new(script: Vec<Script>) -> Self {
        Self {
            script: Mutex::new(script),
            call_count: Mutex::new(0),
        }
    }

    pub fn always_succeed() -> Self {
        Self::new(vec![Script::Succeed])
    }

    pub fn call_count(&self) -> u32 {
        *self.call_count.lock()
    }
}

#[async_trait::async_trait]
impl Process for ScriptedProcess {
    async fn process(&self, cancel: CancellationToken, _job: &Job) -> ProcessOutcome {
        let step = {
            let mut script = self.script.lock();
            let mut count = self.call_count.lock();
            let idx = (*count as usize).min(script.len().saturating_sub(1));
            *count += 1;
            std::mem::replace(&mut script[idx], Script::Succeed)
        };

        match step {
            Script::Succeed => ProcessOutcome::Success {
                result_ref: "in-memory-result".to_string(),
            },
            Script::Fail(reason) => ProcessOutcome::Failure {
                error: reason.into(),
                class: ErrorClass::Transient,
            },
            Script::FailFatal(reason) => ProcessOutcome::Failure {
                error: reason.into(),
                class: ErrorClass::FatalToJob,
            },
            Script::FailWorkerLocal(reason) => ProcessOutcome::Failure {
                error: reason.into(),
                class: ErrorClass::WorkerLocal,
            },
            Script::HangUntilCancelled => {
                cancel.cancelled().await;
                ProcessOutcome::Failure {
                    error: "cancelled".into(),
                    class: ErrorClass::Transient,
                }
            }
        }
    }
}
