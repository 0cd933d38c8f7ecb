use diesel::prelude::*;
use jiff::Timestamp;
use uuid::Uuid;

use forge_core::job::{Job, JobState as CoreJobState, Lane as CoreLane, TenantPlan};
use forge_core::store::JobUpdate;

use crate::error::{PgError, PgResult};
use crate::schema::jobs;
use crate::types::{JobStateSql, LaneSql};

fn tenant_plan_to_str(plan: TenantPlan) -> &'static str {
    match plan {
        TenantPlan::Free => "free",
        TenantPlan::Basic => "basic",
        TenantPlan::Pro => "pro",
        TenantPlan::Enterprise => "enterprise",
        TenantPlan::Unlimited => "unlimited",
    }
}

fn tenant_plan_from_str(s: &str) -> PgResult<TenantPlan> {
    match s {
        "free" => Ok(TenantPlan::Free),
        "basic" => Ok(TenantPlan::Basic),
        "pro" => Ok(TenantPlan::Pro),
        "enterprise" => Ok(TenantPlan::Enterprise),
        "unlimited" => Ok(TenantPlan::Unlimited),
        other => Err(PgError::Unexpected(format!("unknown tenant_plan: {other}").into())),
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = jobs, primary_key(job_id), check_for_backend(diesel::pg::Pg))]
pub struct JobRow {
    pub job_id: Uuid,
    pub tenant_id: Uuid,
    pub submitted_at: Timestamp,
    pub file_ref: String,
    pub file_size_bytes: i64,
    pub tenant_plan: String,
    pub attempts: i32,
    pub max_attempts: i32,
    pub priority_key: i16,
    pub lane: LaneSql,
    pub state: JobStateSql,
    pub worker_id: Option<Uuid>,
    pub started_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
    pub last_heartbeat: Option<Timestamp>,
    pub last_error: Option<String>,
    pub result_ref: Option<String>,
}

impl JobRow {
    pub fn into_job(self) -> PgResult<Job> {
        Ok(Job {
            job_id: self.job_id,
            tenant_id: self.tenant_id,
            submitted_at: self.submitted_at,
            file_ref: self.file_ref,
            file_size_bytes: self.file_size_bytes as u64,
            tenant_plan: tenant_plan_from_str(&self.tenant_plan)?,
            attempts: self.attempts as u32,
            max_attempts: self.max_attempts as u32,
            priority_key: self.priority_key as u8,
            lane: CoreLane::from(self.lane),
            state: CoreJobState::from(self.state),
            worker_id: self.worker_id,
            started_at: self.started_at,
            finished_at: self.finished_at,
            last_heartbeat: self.last_heartbeat,
            last_error: self.last_error,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = jobs)]
pub struct NewJobRow {
    pub job_id: Uuid,
    pub tenant_id: Uuid,
    pub submitted_at: Timestamp,
    pub file_ref: String,
    pub file_size_bytes: i64,
    pub tenant_plan: String,
    pub attempts: i32,
    pub max_attempts: i32,
    pub priority_key: i16,
    pub lane: LaneSql,
    pub state: JobStateSql,
    pub worker_id: Option<Uuid>,
    pub started_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
    pub last_heartbeat: Option<Timestamp>,
    pub last_error: Option<String>,
    pub result_ref: Option<String>,
}

impl From<&Job> for NewJobRow {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.job_id,
            tenant_id: job.tenant_id,
            submitted_at: job.submitted_at,
            file_ref: job.file_ref.clone(),
            file_size_bytes: job.file_size_bytes as i64,
            tenant_plan: tenant_plan_to_str(job.tenant_plan).to_string(),
            attempts: job.attempts as i32,
            max_attempts: job.max_attempts as i32,
            priority_key: job.priority_key as i16,
            lane: job.lane.into(),
            state: job.state.into(),
            worker_id: job.worker_id,
            started_at: job.started_at,
            finished_at: job.finished_at,
            last_heartbeat: job.last_heartbeat,
            last_error: job.last_error.clone(),
            result_ref: None,
        }
    }
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = jobs)]
pub struct JobChangeset {
    pub state: Option<JobStateSql>,
    pub attempts: Option<i32>,
    pub worker_id: Option<Option<Uuid>>,
    pub started_at: Option<Option<Timestamp>>,
    pub finished_at: Option<Option<Timestamp>>,
    pub last_heartbeat: Option<Option<Timestamp>>,
    pub last_error: Option<Option<String>>,
    pub submitted_at: Option<Timestamp>,
    pub result_ref: Option<Option<String>>,
}

impl From<JobUpdate> for JobChangeset {
    fn from(update: JobUpdate) -> Self {
        Self {
            state: update.state.map(JobStateSql::from),
            attempts: update.attempts.map(|a| a as i32),
            worker_id: update.worker_id,
            started_at: update.started_at,
            finished_at: update.finished_at,
            last_heartbeat: update.last_heartbeat,
            last_error: update.last_error,
            submitted_at: update.submitted_at,
            result_ref: update.result_ref,
        }
    }
}
