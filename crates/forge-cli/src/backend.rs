//! Backend wiring: turns the parsed `Cli` into the `ControllerDeps` the
//! Cluster Controller needs (§4.8 `Start`). `Process` and `TenantQuota`
//! are always the in-memory doubles from `forge-test` — the
//! document-parsing algorithm and the billing/subscription quota ledger
//! are both host concerns explicitly out of scope (§1) and no concrete
//! crate for either exists in this workspace, mirroring how
//! `nvisy_cli::create_service_state` swaps in `nvisy_test::create_mock_services`
//! for whichever AI backend feature wasn't compiled in.

use std::sync::Arc;

use forge_controller::ControllerDeps;
use forge_core::clock::{Clock, SystemClock};
use forge_core::events::EventSink;
use forge_core::store::Store;
use forge_test::{InMemoryQuota, ScriptedProcess};
use forge_worker::NullMemoryProbe;

use crate::config::Cli;

/// Assembles the six `ControllerDeps` collaborators according to which of
/// `postgres`/`nats` were compiled in; falls back to the `forge-test`
/// doubles for whichever backend wasn't.
pub async fn build_deps(cli: &Cli) -> anyhow::Result<ControllerDeps> {
    let store = build_store(cli).await?;
    let events = build_events(cli).await?;

    Ok(ControllerDeps {
        store,
        events,
        process: Arc::new(ScriptedProcess::always_succeed()),
        quota: Arc::new(InMemoryQuota::new()),
        clock: Arc::new(SystemClock) as Arc<dyn Clock>,
        probe: Arc::new(NullMemoryProbe),
    })
}

#[cfg(feature = "postgres")]
async fn build_store(cli: &Cli) -> anyhow::Result<Arc<dyn Store>> {
    use forge_postgres::{PgClientExt, PgStore};

    cli.postgres.validate().map_err(anyhow::Error::msg)?;
    let client = cli.postgres.clone().build().map_err(anyhow::Error::msg)?;

    let result = client.migrate().await.map_err(anyhow::Error::msg)?;
    tracing::info!(
        target: "forge_cli::backend",
        database = %cli.postgres.database_url_masked(),
        applied = result.applied.len(),
        "ran pending database migrations"
    );

    Ok(Arc::new(PgStore::new(client)))
}

#[cfg(not(feature = "postgres"))]
async fn build_store(_cli: &Cli) -> anyhow::Result<Arc<dyn Store>> {
    tracing::warn!(
        target: "forge_cli::backend",
        "no 'postgres' feature compiled in; job state is kept in-memory and lost on restart"
    );
    Ok(Arc::new(forge_test::InMemoryStore::new()))
}

#[cfg(feature = "nats")]
async fn build_events(cli: &Cli) -> anyhow::Result<Arc<dyn EventSink>> {
    use forge_nats::{NatsClient, NatsEventSink};

    let client = NatsClient::connect(&cli.nats).await.map_err(anyhow::Error::msg)?;
    Ok(Arc::new(NatsEventSink::new(client)))
}

#[cfg(not(feature = "nats"))]
async fn build_events(_cli: &Cli) -> anyhow::Result<Arc<dyn EventSink>> {
    tracing::warn!(
        target: "forge_cli::backend",
        "no 'nats' feature compiled in; control-plane events are only recorded in-process"
    );
    Ok(Arc::new(forge_test::RecordingEventSink::new()))
}
