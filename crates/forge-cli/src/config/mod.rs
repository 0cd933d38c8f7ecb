//! The CLI's configuration tree, grounded on `nvisy_cli::config::Cli`:
//! one flattened `clap::Parser` struct composed of each backend's own
//! config, so the binary's `--help` output is generated rather than
//! hand-maintained.

mod server;

pub use server::ServerConfig;

use clap::Parser;
use forge_controller::FabricConfig;

/// Top-level CLI, composed of the Control API's own bind config, the
/// fabric's full knob surface, and whichever storage/event backends were
/// compiled in (§4.8 `Start`).
#[derive(Debug, Clone, Parser)]
#[command(name = "forge", about = "Job execution fabric: priority queue, resource gate, worker pool, autoscaler")]
pub struct Cli {
    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub fabric: FabricConfig,

    #[cfg(feature = "postgres")]
    #[command(flatten)]
    pub postgres: forge_postgres::PgConfig,

    #[cfg(feature = "nats")]
    #[command(flatten)]
    pub nats: forge_nats::NatsConfig,
}

impl Cli {
    /// Loads a `.env` file if present, then parses `std::env::args`
    /// (mirrors `nvisy_cli::config::Cli::init`).
    pub fn init() -> Self {
        if let Err(error) = dotenvy::dotenv() {
            if !error.not_found() {
                tracing::warn!(target: "forge_cli::config", %error, "failed to load .env file");
            }
        }
        Self::parse()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.server.validate()?;
        self.fabric.validate().map_err(anyhow::Error::msg)?;
        Ok(())
    }
}

/// Lists the compile-time backend features active in this build, for the
/// startup log line (mirrors `nvisy_cli::main::enabled_features`).
pub fn enabled_features() -> Vec<&'static str> {
    [
        cfg!(feature = "postgres").then_some("postgres"),
        cfg!(feature = "nats").then_some("nats"),
        cfg!(feature = "mock").then_some("mock"),
    ]
    .into_iter()
    .flatten()
    .collect()
}
