//! Error types for the PostgreSQL `Store` backend.

use std::borrow::Cow;

use deadpool::managed::TimeoutType;
use diesel::ConnectionError;
use diesel::result::Error as DieselError;

pub type PgResult<T, E = PgError> = Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum PgError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database operation timed out")]
    Timeout(TimeoutType),

    #[error("database connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("database migration error: {0}")]
    Migration(Box<dyn std::error::Error + Send + Sync>),

    #[error("database query error: {0}")]
    Query(#[from] DieselError),

    #[error("unexpected error: {0}")]
    Unexpected(Cow<'static, str>),
}

impl PgError {
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PgError::Timeout(_) | PgError::Connection(ConnectionError::BadConnection(_))
        )
    }
}

type DeadpoolError = diesel_async::pooled_connection::deadpool::PoolError;
type DieselPoolError = diesel_async::pooled_connection::PoolError;

impl From<DeadpoolError> for PgError {
    fn from(value: DeadpoolError) -> Self {
        match value {
            DeadpoolError::Timeout(timeout) => Self::Timeout(timeout),
            DeadpoolError::Backend(DieselPoolError::QueryError(error)) => Self::Query(error),
            DeadpoolError::Backend(DieselPoolError::ConnectionError(error)) => {
                Self::Connection(error)
            }
            DeadpoolError::PostCreateHook(err) => {
                tracing::warn!("unexpected post-create hook error: {}", err);
                Self::Unexpected(err.to_string().into())
            }
            DeadpoolError::NoRuntimeSpecified => {
                Self::Unexpected("no runtime specified".into())
            }
            DeadpoolError::Closed => Self::Connection(ConnectionError::InvalidConnectionUrl(
                "connection pool is closed".into(),
            )),
        }
    }
}

/// Bridges `PgError` into the fabric-wide error used by `forge_core::Store`.
/// Transient pool/connection trouble is `System` (§7): admission pauses and
/// the controller keeps retrying with backoff rather than failing the job.
impl From<PgError> for forge_core::error::Error {
    fn from(value: PgError) -> Self {
        forge_core::error::Error::store_unreachable(Box::new(value))
    }
}
