use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::MigrationHarness;

use super::migrate_result::{MigrationResult, MigrationStatus};
use crate::MIGRATIONS;
use crate::client::PgClient;
use crate::error::{PgError, PgResult};

use super::run_migration::run_pending_migrations;

/// Migration operations layered onto [`PgClient`], kept as an extension
/// trait so the base client stays free of `diesel_migrations` in its
/// public surface.
#[async_trait::async_trait]
pub trait PgClientExt {
    async fn migrate(&self) -> PgResult<MigrationResult>;
    async fn migration_status(&self) -> PgResult<MigrationStatus>;
}

#[async_trait::async_trait]
impl PgClientExt for PgClient {
    async fn migrate(&self) -> PgResult<MigrationResult> {
        run_pending_migrations(self.config()).await
    }

    async fn migration_status(&self) -> PgResult<MigrationStatus> {
        let database_url = self.config().postgres_url.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = PgConnection::establish(&database_url)
                .map_err(|e| PgError::Connection(e.into()))?;

            let pending = conn
                .pending_migrations(MIGRATIONS)
                .map_err(PgError::Migration)?
                .iter()
                .map(|m| m.name().to_string())
                .collect::<Vec<_>>();

            Ok(if pending.is_empty() {
                MigrationStatus::UpToDate
            } else {
                MigrationStatus::Pending(pending)
            })
        })
        .await
        .map_err(|e| PgError::Unexpected(format!("migration task panicked: {e}").into()))?
    }
}
