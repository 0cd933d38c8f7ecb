mod client_ext;
mod migrate_result;
mod run_migration;

pub use client_ext::PgClientExt;
pub use migrate_result::{MigrationRecord, MigrationResult, MigrationStatus};
pub use run_migration::run_pending_migrations;
