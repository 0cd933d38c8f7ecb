//! Health monitor / recovery error taxonomy (§7).

use forge_core::error::{Classify, ErrorClass};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("job store error: {0}")]
    Store(#[from] forge_core::error::Error),
}

impl Classify for Error {
    fn classify(&self) -> ErrorClass {
        match self {
            Error::Store(inner) => inner.classify(),
        }
    }
}
