use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use jiff::Timestamp;
use uuid::Uuid;

use forge_core::job::Job;
use forge_core::store::JobUpdate;

use crate::TRACING_TARGET_QUERY;
use crate::error::PgResult;
use crate::model::{JobChangeset, JobRow, NewJobRow};
use crate::schema::jobs;
use crate::types::JobStateSql;

/// Queries against the `jobs` table (§6 Store interface).
#[derive(Debug, Default, Clone, Copy)]
pub struct JobRepository;

impl JobRepository {
    #[tracing::instrument(skip(conn, job), target = TRACING_TARGET_QUERY, fields(job_id = %job.job_id))]
    pub async fn insert(conn: &mut AsyncPgConnection, job: &Job) -> PgResult<()> {
        let row = NewJobRow::from(job);
        diesel::insert_into(jobs::table).values(&row).execute(conn).await?;
        Ok(())
    }

    #[tracing::instrument(skip(conn, update), target = TRACING_TARGET_QUERY)]
    pub async fn update(conn: &mut AsyncPgConnection, job_id: Uuid, update: JobUpdate) -> PgResult<()> {
        let changeset = JobChangeset::from(update);
        diesel::update(jobs::table.find(job_id))
            .set(&changeset)
            .execute(conn)
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(conn), target = TRACING_TARGET_QUERY)]
    pub async fn get(conn: &mut AsyncPgConnection, job_id: Uuid) -> PgResult<Option<Job>> {
        let row = jobs::table
            .find(job_id)
            .select(JobRow::as_select())
            .first(conn)
            .await
            .optional()?;
        row.map(JobRow::into_job).transpose()
    }

    /// Jobs in `Running` or `LostWorker` whose `last_heartbeat` is older
    /// than `threshold` (§4.5 recovery scan).
    #[tracing::instrument(skip(conn), target = TRACING_TARGET_QUERY)]
    pub async fn list_recoverable(
        conn: &mut AsyncPgConnection,
        threshold: Timestamp,
    ) -> PgResult<Vec<Job>> {
        let rows = jobs::table
            .filter(jobs::state.eq_any([JobStateSql::Running, JobStateSql::LostWorker]))
            .filter(jobs::last_heartbeat.lt(threshold).or(jobs::last_heartbeat.is_null()))
            .select(JobRow::as_select())
            .load(conn)
            .await?;
        rows.into_iter().map(JobRow::into_job).collect()
    }

    #[tracing::instrument(skip(conn), target = TRACING_TARGET_QUERY)]
    pub async fn list_queued(conn: &mut AsyncPgConnection) -> PgResult<Vec<Job>> {
        let rows = jobs::table
            .filter(jobs::state.eq(JobStateSql::Queued))
            .select(JobRow::as_select())
            .load(conn)
            .await?;
        rows.into_iter().map(JobRow::into_job).collect()
    }
}
