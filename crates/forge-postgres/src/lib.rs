//! PostgreSQL-backed implementation of `forge_core::store::Store`.
//!
//! Three tables carry the fabric's durable state: `jobs`, `workers`, and
//! `queue_stats`. See [`store_impl::PgStore`] for the `Store` impl that
//! wires the connection pool and repositories together.

#![forbid(unsafe_code)]

pub mod client;
pub mod error;
pub mod model;
pub mod query;
mod schema;
mod store_impl;
pub mod types;

use deadpool::managed::Pool;
use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_migrations::{EmbeddedMigrations, embed_migrations};

pub use client::{PgClient, PgConfig, PgConn, PgPoolStatus};
pub use client::migrate::{MigrationRecord, MigrationResult, MigrationStatus, PgClientExt};
pub use store_impl::PgStore;

pub(crate) const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

pub(crate) type ConnectionPool =
    Pool<AsyncDieselConnectionManager<AsyncPgConnection>>;
pub(crate) type PooledConnection =
    deadpool::managed::Object<AsyncDieselConnectionManager<AsyncPgConnection>>;

pub(crate) const TRACING_TARGET_CONNECTION: &str = "forge_postgres::connection";
pub(crate) const TRACING_TARGET_QUERY: &str = "forge_postgres::query";
pub(crate) const TRACING_TARGET_MIGRATION: &str = "forge_postgres::migration";
