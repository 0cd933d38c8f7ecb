//! The concrete `Store` backend (component C3, §6).

use jiff::Timestamp;
use uuid::Uuid;

use forge_core::error::{Error as CoreError, Result as CoreResult};
use forge_core::job::Job;
use forge_core::store::{JobUpdate, QueueStat, Store, WorkerMetric};

use crate::client::PgClient;
use crate::query::{JobRepository, QueueStatRepository, WorkerRepository};

/// `Store` implementation backed by [`PgClient`]'s connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    client: PgClient,
}

impl PgStore {
    pub fn new(client: PgClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Store for PgStore {
    async fn insert_job(&self, job: &Job) -> CoreResult<()> {
        let mut conn = self.client.get_connection().await.map_err(CoreError::from)?;
        JobRepository::insert(&mut conn, job).await.map_err(CoreError::from)
    }

    async fn update_job(&self, job_id: Uuid, update: JobUpdate) -> CoreResult<()> {
        let mut conn = self.client.get_connection().await.map_err(CoreError::from)?;
        JobRepository::update(&mut conn, job_id, update).await.map_err(CoreError::from)
    }

    async fn get_job(&self, job_id: Uuid) -> CoreResult<Option<Job>> {
        let mut conn = self.client.get_connection().await.map_err(CoreError::from)?;
        JobRepository::get(&mut conn, job_id).await.map_err(CoreError::from)
    }

    async fn list_recoverable(&self, threshold: Timestamp) -> CoreResult<Vec<Job>> {
        let mut conn = self.client.get_connection().await.map_err(CoreError::from)?;
        JobRepository::list_recoverable(&mut conn, threshold).await.map_err(CoreError::from)
    }

    async fn list_queued(&self) -> CoreResult<Vec<Job>> {
        let mut conn = self.client.get_connection().await.map_err(CoreError::from)?;
        JobRepository::list_queued(&mut conn).await.map_err(CoreError::from)
    }

    async fn append_worker_metric(&self, metric: WorkerMetric) -> CoreResult<()> {
        let mut conn = self.client.get_connection().await.map_err(CoreError::from)?;
        WorkerRepository::append_metric(&mut conn, metric).await.map_err(CoreError::from)
    }

    async fn append_queue_stat(&self, stat: QueueStat) -> CoreResult<()> {
        let mut conn = self.client.get_connection().await.map_err(CoreError::from)?;
        QueueStatRepository::append(&mut conn, stat).await.map_err(CoreError::from)
    }
}
