// Run history repository implementation

use crate::db::DbPool;
use crate::errors::{DatabaseError, StoreError};
use crate::models::RunRecord;
use crate::store::RunStore;
use async_trait::async_trait;
use tracing::instrument;
use uuid::Uuid;

/// Append-only access to `job_runs`
#[derive(Clone)]
pub struct RunRepository {
    pool: DbPool,
}

impl RunRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Most recent runs of a job, newest first
    #[instrument(skip(self))]
    pub async fn latest_runs(&self, job_id: Uuid, limit: i64) -> Result<Vec<RunRecord>, DatabaseError> {
        let runs = sqlx::query_as::<_, RunRecord>(
            r#"
            SELECT job_id, run_at, success, diagnostics
            FROM job_runs
            WHERE job_id = $1
            ORDER BY run_at DESC
            LIMIT $2
            "#,
        )
        .bind(job_id)
        .bind(limit)
        .fetch_all(self.pool.pool())
        .await?;

        Ok(runs)
    }

    #[instrument(skip(self, record), fields(job_id = %record.job_id, success = record.success))]
    pub async fn create(&self, record: &RunRecord) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO job_runs (job_id, run_at, success, diagnostics)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(record.job_id)
        .bind(record.run_at)
        .bind(record.success)
        .bind(&record.diagnostics)
        .execute(self.pool.pool())
        .await?;

        tracing::debug!("Job run recorded");
        Ok(())
    }
}

#[async_trait]
impl RunStore for RunRepository {
    async fn recent_runs(&self, job_id: Uuid, limit: usize) -> Result<Vec<RunRecord>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        Ok(self.latest_runs(job_id, limit).await?)
    }

    async fn insert_run(&self, record: &RunRecord) -> Result<(), StoreError> {
        Ok(self.create(record).await?)
    }
}
