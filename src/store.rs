use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::job::{Job, NewJob, UpsertOutcome};

/// Write-side capability shared by every scraper pipeline. The store is
/// the only resource adapter tasks share; it must tolerate concurrent
/// upserts racing on different keys.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn upsert(&self, job: &NewJob) -> Result<UpsertOutcome, AppError>;
}

/// Postgres-backed store. Uniqueness of `(source, source_job_id)` is
/// enforced by the partial unique index behind `Job::upsert`.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgStore {
    async fn upsert(&self, job: &NewJob) -> Result<UpsertOutcome, AppError> {
        Job::upsert(&self.pool, job).await
    }
}
