use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::MigrationHarness;
use jiff::Timestamp;

use super::migrate_result::{MigrationRecord, MigrationResult};
use crate::MIGRATIONS;
use crate::client::PgConfig;
use crate::error::{PgError, PgResult};

/// Applies pending migrations using a dedicated blocking connection.
///
/// `diesel_migrations` only runs against a synchronous [`Connection`], so
/// this opens a plain [`PgConnection`] outside the async pool and drives it
/// from a blocking thread, mirroring how the teacher's CLI runs migrations
/// once at startup before accepting traffic.
pub async fn run_pending_migrations(config: &PgConfig) -> PgResult<MigrationResult> {
    let database_url = config.postgres_url.clone();

    tokio::task::spawn_blocking(move || {
        let mut conn = PgConnection::establish(&database_url)
            .map_err(|e| PgError::Connection(e.into()))?;

        let applied_versions = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(PgError::Migration)?;

        let now = Timestamp::now();
        let applied = applied_versions
            .iter()
            .map(|v| MigrationRecord { version: v.to_string(), applied_at: now })
            .collect();

        Ok(MigrationResult { applied })
    })
    .await
    .map_err(|e| PgError::Unexpected(format!("migration task panicked: {e}").into()))?
}
