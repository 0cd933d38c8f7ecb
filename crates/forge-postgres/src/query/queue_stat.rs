use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use forge_core::store::QueueStat;

use crate::TRACING_TARGET_QUERY;
use crate::error::PgResult;
use crate::model::NewQueueStatRow;
use crate::schema::queue_stats;

/// Queries against the `queue_stats` table (§6 `queue_stats` table).
#[derive(Debug, Default, Clone, Copy)]
pub struct QueueStatRepository;

impl QueueStatRepository {
    #[tracing::instrument(skip(conn, stat), target = TRACING_TARGET_QUERY)]
    pub async fn append(conn: &mut AsyncPgConnection, stat: QueueStat) -> PgResult<()> {
        let row = NewQueueStatRow::from(stat);
        diesel::insert_into(queue_stats::table).values(&row).execute(conn).await?;
        Ok(())
    }
}
