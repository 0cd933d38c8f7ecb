//! Errors for priority queue operations (§4.1 Failure).

use forge_core::error::{Classify, ErrorClass};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The optional per-lane cap was exceeded. Not enforced by default.
    #[error("lane '{lane}' is full (cap {cap})")]
    QueueFull { lane: &'static str, cap: u32 },

    #[error("unknown lane: {0}")]
    UnknownLane(String),

    #[error("job store error: {0}")]
    Store(#[from] forge_core::error::Error),
}

impl Error {
    pub fn queue_full(lane: &'static str, cap: u32) -> Self {
        Self::QueueFull { lane, cap }
    }
}

impl Classify for Error {
    fn classify(&self) -> ErrorClass {
        match self {
            Error::QueueFull { .. } | Error::UnknownLane(_) => ErrorClass::Configuration,
            Error::Store(inner) => inner.classify(),
        }
    }
}
