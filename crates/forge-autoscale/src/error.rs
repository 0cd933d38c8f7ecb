//! Autoscaler error taxonomy (§7).

use forge_core::error::{Classify, ErrorClass};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid autoscale configuration: {0}")]
    InvalidConfig(String),
}

impl Classify for Error {
    fn classify(&self) -> ErrorClass {
        match self {
            Error::InvalidConfig(_) => ErrorClass::Configuration,
        }
    }
}
