mod custom_hooks;
pub mod migrate;
mod pg_client;
mod pg_config;

pub use pg_client::{PgClient, PgConn, PgPoolStatus};
pub use pg_config::PgConfig;
