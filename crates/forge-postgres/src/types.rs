//! `DbEnum` bridges between `forge-core`'s wire types and the Postgres
//! `job_state`/`lane`/`worker_status` enum types (§6 persisted state
//! layout). Kept as thin wrappers rather than deriving `DbEnum` directly
//! on the `forge-core` types themselves, so `forge-core` stays free of a
//! diesel dependency (mirrors how `nvisy-postgres::types::enums` wraps
//! domain concepts behind its own `DbEnum` types).

use diesel_derive_enum::DbEnum;
use forge_core::job::{JobState as CoreJobState, Lane as CoreLane};
use forge_core::worker::WorkerStatus as CoreWorkerStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, DbEnum)]
#[ExistingTypePath = "crate::schema::sql_types::Lane"]
pub enum LaneSql {
    #[db_rename = "premium"]
    Premium,
    #[db_rename = "normal"]
    Normal,
    #[db_rename = "large"]
    Large,
}

impl From<CoreLane> for LaneSql {
    fn from(lane: CoreLane) -> Self {
        match lane {
            CoreLane::Premium => Self::Premium,
            CoreLane::Normal => Self::Normal,
            CoreLane::Large => Self::Large,
        }
    }
}

impl From<LaneSql> for CoreLane {
    fn from(lane: LaneSql) -> Self {
        match lane {
            LaneSql::Premium => Self::Premium,
            LaneSql::Normal => Self::Normal,
            LaneSql::Large => Self::Large,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, DbEnum)]
#[ExistingTypePath = "crate::schema::sql_types::JobState"]
pub enum JobStateSql {
    #[db_rename = "queued"]
    Queued,
    #[db_rename = "running"]
    Running,
    #[db_rename = "completed"]
    Completed,
    #[db_rename = "failed"]
    Failed,
    #[db_rename = "lost_worker"]
    LostWorker,
    #[db_rename = "cancelled"]
    Cancelled,
}

impl From<CoreJobState> for JobStateSql {
    fn from(state: CoreJobState) -> Self {
        match state {
            CoreJobState::Queued => Self::Queued,
            CoreJobState::Running => Self::Running,
            CoreJobState::Completed => Self::Completed,
            CoreJobState::Failed => Self::Failed,
            CoreJobState::LostWorker => Self::LostWorker,
            CoreJobState::Cancelled => Self::Cancelled,
        }
    }
}

impl From<JobStateSql> for CoreJobState {
    fn from(state: JobStateSql) -> Self {
        match state {
            JobStateSql::Queued => Self::Queued,
            JobStateSql::Running => Self::Running,
            JobStateSql::Completed => Self::Completed,
            JobStateSql::Failed => Self::Failed,
            JobStateSql::LostWorker => Self::LostWorker,
            JobStateSql::Cancelled => Self::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, DbEnum)]
#[ExistingTypePath = "crate::schema::sql_types::WorkerStatus"]
pub enum WorkerStatusSql {
    #[db_rename = "idle"]
    Idle,
    #[db_rename = "processing"]
    Processing,
    #[db_rename = "stalled"]
    Stalled,
    #[db_rename = "error"]
    Error,
    #[db_rename = "terminating"]
    Terminating,
}

impl From<CoreWorkerStatus> for WorkerStatusSql {
    fn from(status: CoreWorkerStatus) -> Self {
        match status {
            CoreWorkerStatus::Idle => Self::Idle,
            CoreWorkerStatus::Processing => Self::Processing,
            CoreWorkerStatus::Stalled => Self::Stalled,
            CoreWorkerStatus::Error => Self::Error,
            CoreWorkerStatus::Terminating => Self::Terminating,
        }
    }
}
