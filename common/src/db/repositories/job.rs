// Job repository implementation

use crate::db::DbPool;
use crate::errors::{DatabaseError, StoreError};
use crate::interval::RunInterval;
use crate::models::{Job, RunWindow};
use crate::store::JobStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::Row;
use tracing::instrument;
use uuid::Uuid;

const JOB_COLUMNS: &str = "id, interval_ms, template_id, payload, next_run_min, next_run_max, path";

/// Repository for job-related database operations
#[derive(Clone)]
pub struct JobRepository {
    pool: DbPool,
}

impl JobRepository {
    /// Create a new JobRepository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn job_from_row(row: &PgRow) -> Result<Job, DatabaseError> {
        let interval_ms: i64 = row.try_get("interval_ms")?;
        let interval = RunInterval::from_millis(interval_ms)
            .map_err(|e| DatabaseError::QueryFailed(format!("Invalid stored interval: {}", e)))?;

        Ok(Job {
            id: row.try_get("id")?,
            interval,
            template_id: row.try_get("template_id")?,
            payload: row.try_get("payload")?,
            path: row.try_get("path")?,
            window: RunWindow::new(row.try_get("next_run_min")?, row.try_get("next_run_max")?),
        })
    }

    /// Jobs whose window overlaps `[now, horizon]` or has already closed
    #[instrument(skip(self))]
    pub async fn find_jobs_due(
        &self,
        now: DateTime<Utc>,
        horizon: DateTime<Utc>,
    ) -> Result<Vec<Job>, DatabaseError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM jobs
            WHERE (next_run_min <= $2 AND next_run_max >= $1)
               OR next_run_max < $1
            "#
        ))
        .bind(now)
        .bind(horizon)
        .fetch_all(self.pool.pool())
        .await?;

        let jobs = rows
            .iter()
            .map(Self::job_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(count = jobs.len(), "Found jobs due for execution");
        Ok(jobs)
    }

    #[instrument(skip(self))]
    pub async fn find_job(&self, id: Uuid) -> Result<Option<Job>, DatabaseError> {
        let row = sqlx::query(&format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"))
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await?;

        row.as_ref().map(Self::job_from_row).transpose()
    }

    /// Overwrite the job's next-run window
    #[instrument(skip(self))]
    pub async fn set_window(&self, id: Uuid, window: RunWindow) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET next_run_min = $1, next_run_max = $2
            WHERE id = $3
            "#,
        )
        .bind(window.min)
        .bind(window.max)
        .bind(id)
        .execute(self.pool.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Job not found: {}", id)));
        }

        tracing::debug!(job_id = %id, "Job window updated");
        Ok(())
    }

    #[instrument(skip(self, job), fields(job_id = %job.id))]
    pub async fn create(&self, job: &Job) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO jobs (
                id, interval_ms, template_id, payload,
                next_run_min, next_run_max, path
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(job.id)
        .bind(job.interval.as_millis())
        .bind(job.template_id)
        .bind(&job.payload)
        .bind(job.window.min)
        .bind(job.window.max)
        .bind(&job.path)
        .execute(self.pool.pool())
        .await?;

        tracing::info!(job_id = %job.id, template_id = %job.template_id, "Job created");
        Ok(())
    }
}

#[async_trait]
impl JobStore for JobRepository {
    async fn find_due(
        &self,
        now: DateTime<Utc>,
        horizon: DateTime<Utc>,
    ) -> Result<Vec<Job>, StoreError> {
        Ok(self.find_jobs_due(now, horizon).await?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Job>, StoreError> {
        Ok(self.find_job(id).await?)
    }

    async fn update_window(&self, id: Uuid, window: RunWindow) -> Result<(), StoreError> {
        Ok(self.set_window(id, window).await?)
    }

    async fn insert(&self, job: &Job) -> Result<(), StoreError> {
        Ok(self.create(job).await?)
    }
}
