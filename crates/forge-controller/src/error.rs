//! Cluster Controller error taxonomy (§4.8, §7).

use forge_core::error::{Classify, ErrorClass};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("job store error: {0}")]
    Core(#[from] forge_core::error::Error),

    #[error("queue error: {0}")]
    Queue(#[from] forge_queue::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("cluster is shutting down, new submissions are rejected")]
    ShuttingDown,
}

impl Classify for Error {
    fn classify(&self) -> ErrorClass {
        match self {
            Error::Core(inner) => inner.classify(),
            Error::Queue(inner) => inner.classify(),
            Error::InvalidConfig(_) => ErrorClass::Configuration,
            Error::ShuttingDown => ErrorClass::System,
        }
    }
}
