#![forbid(unsafe_code)]

//! Binary entry point for `forge`: parses configuration, wires the
//! Store/EventSink/Process/TenantQuota collaborators for whichever
//! backend features were compiled in, starts the Cluster Controller, and
//! serves the Control API (§6) until SIGINT/SIGTERM.

mod backend;
mod config;
mod shutdown;

use std::process;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::Cli;

pub const TRACING_TARGET_STARTUP: &str = "forge_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "forge_cli::shutdown";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(target: TRACING_TARGET_SHUTDOWN, "application terminated successfully");
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(target: TRACING_TARGET_SHUTDOWN, error = %error, "application terminated with error");
    } else {
        eprintln!("Error: {error:#}");
    }
    process::exit(1);
}

/// Entry point proper (§4.8 `Start`): parses config, wires the Store/
/// EventSink/Process/TenantQuota collaborators, starts the Cluster
/// Controller, and serves the Control API until a shutdown signal.
async fn run() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::init();
    cli.validate().context("invalid configuration")?;
    log_startup_info(&cli);

    let deps = backend::build_deps(&cli).await.context("failed to build fabric dependencies")?;
    let controller = forge_controller::ClusterController::start(deps, cli.fabric)
        .await
        .context("failed to start cluster controller")?;

    let state = forge_server::ServerState::new(controller.clone());
    let router = forge_server::router(state);
    let addr = cli.server.server_addr();

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind control API to {addr}"))?;

    tracing::info!(target: TRACING_TARGET_STARTUP, %addr, "control api listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown::shutdown_signal())
        .await
        .context("control api server error")?;

    let report = controller.shutdown(cli.server.shutdown_deadline()).await;
    tracing::info!(
        target: TRACING_TARGET_SHUTDOWN,
        workers_terminated = report.workers_terminated,
        residual_in_flight = report.residual_in_flight,
        "fabric drained"
    );

    if report.residual_in_flight > 0 {
        tracing::warn!(
            target: TRACING_TARGET_SHUTDOWN,
            residual_in_flight = report.residual_in_flight,
            "shutdown deadline expired with jobs still in flight"
        );
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn log_startup_info(cli: &Cli) {
    tracing::info!(
        target: TRACING_TARGET_STARTUP,
        version = env!("CARGO_PKG_VERSION"),
        "starting forge fabric"
    );
    tracing::debug!(
        target: TRACING_TARGET_STARTUP,
        pid = process::id(),
        arch = std::env::consts::ARCH,
        os = std::env::consts::OS,
        features = ?config::enabled_features(),
        min_workers = cli.fabric.autoscale.min_workers,
        max_workers = cli.fabric.autoscale.max_workers,
        "build information"
    );
}
