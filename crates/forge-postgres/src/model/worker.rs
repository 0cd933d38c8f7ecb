use diesel::prelude::*;
use jiff::Timestamp;
use uuid::Uuid;

use forge_core::store::WorkerMetric;

use crate::schema::workers;
use crate::types::{LaneSql, WorkerStatusSql};

/// One row in `workers`: the latest health/throughput sample for a worker
/// (§6 `workers` table, §5.4 health monitor input).
#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = workers, primary_key(worker_id), check_for_backend(diesel::pg::Pg))]
pub struct WorkerRow {
    pub worker_id: Uuid,
    pub lane: LaneSql,
    pub status: WorkerStatusSql,
    pub created_at: Timestamp,
    pub last_heartbeat: Timestamp,
    pub mem_used_bytes: i64,
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = workers)]
pub struct NewWorkerRow {
    pub worker_id: Uuid,
    pub lane: LaneSql,
    pub status: WorkerStatusSql,
    pub created_at: Timestamp,
    pub last_heartbeat: Timestamp,
    pub mem_used_bytes: i64,
}

impl From<WorkerMetric> for NewWorkerRow {
    fn from(metric: WorkerMetric) -> Self {
        Self {
            worker_id: metric.worker_id,
            lane: metric.lane.into(),
            status: metric.status.into(),
            created_at: metric.recorded_at,
            last_heartbeat: metric.recorded_at,
            mem_used_bytes: metric.mem_used_bytes as i64,
        }
    }
}
