use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use forge_core::store::WorkerMetric;

use crate::TRACING_TARGET_QUERY;
use crate::error::PgResult;
use crate::model::NewWorkerRow;
use crate::schema::workers;

/// Queries against the `workers` table (§6 `workers` table).
#[derive(Debug, Default, Clone, Copy)]
pub struct WorkerRepository;

impl WorkerRepository {
    /// Upserts the latest sample for a worker, keyed on `worker_id`.
    #[tracing::instrument(skip(conn, metric), target = TRACING_TARGET_QUERY, fields(worker_id = %metric.worker_id))]
    pub async fn append_metric(conn: &mut AsyncPgConnection, metric: WorkerMetric) -> PgResult<()> {
        let row = NewWorkerRow::from(metric);
        diesel::insert_into(workers::table)
            .values(&row)
            .on_conflict(workers::worker_id)
            .do_update()
            .set(&row)
            .execute(conn)
            .await?;
        Ok(())
    }
}
