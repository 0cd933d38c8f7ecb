use diesel::prelude::*;
use jiff::Timestamp;

use forge_core::store::QueueStat;

use crate::schema::queue_stats;
use crate::types::LaneSql;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = queue_stats, primary_key(id), check_for_backend(diesel::pg::Pg))]
pub struct QueueStatRow {
    pub id: i64,
    pub lane: LaneSql,
    pub ts: Timestamp,
    pub waiting: i32,
    pub running: i32,
    pub completed: i32,
    pub failed: i32,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = queue_stats)]
pub struct NewQueueStatRow {
    pub lane: LaneSql,
    pub ts: Timestamp,
    pub waiting: i32,
    pub running: i32,
    pub completed: i32,
    pub failed: i32,
}

impl From<QueueStat> for NewQueueStatRow {
    fn from(stat: QueueStat) -> Self {
        Self {
            lane: stat.lane.into(),
            ts: stat.ts,
            waiting: stat.waiting as i32,
            running: stat.running as i32,
            completed: stat.completed as i32,
            failed: stat.failed as i32,
        }
    }
}
