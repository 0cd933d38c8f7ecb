//! Callbacks and hooks for the [`diesel`]/[`deadpool`] connection pool.

use deadpool::managed::{HookResult, Metrics};
use diesel::ConnectionResult;
use diesel_async::pooled_connection::{PoolError, PoolableConnection};
use diesel_async::{AsyncConnection, AsyncPgConnection};
use futures::FutureExt;
use futures::future::BoxFuture;

use crate::TRACING_TARGET_CONNECTION;

pub fn setup_callback<C>(addr: &str) -> BoxFuture<'_, ConnectionResult<C>>
where
    C: AsyncConnection + 'static,
{
    C::establish(addr).boxed()
}

pub fn post_create(conn: &mut AsyncPgConnection, _metrics: &Metrics) -> HookResult<PoolError> {
    tracing::trace!(target: TRACING_TARGET_CONNECTION, hook = "post_create", is_broken = conn.is_broken());
    Ok(())
}

pub fn pre_recycle(conn: &mut AsyncPgConnection, _metrics: &Metrics) -> HookResult<PoolError> {
    tracing::trace!(target: TRACING_TARGET_CONNECTION, hook = "pre_recycle", is_broken = conn.is_broken());
    Ok(())
}

pub fn post_recycle(conn: &mut AsyncPgConnection, _metrics: &Metrics) -> HookResult<PoolError> {
    tracing::trace!(target: TRACING_TARGET_CONNECTION, hook = "post_recycle", is_broken = conn.is_broken());
    Ok(())
}
