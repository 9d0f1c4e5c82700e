// In-memory store, used by tests and for running the pipeline without Postgres

use super::{JobStore, RunStore, TemplateStore};
use crate::errors::StoreError;
use crate::models::{Job, JobTemplate, RunRecord, RunWindow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    templates: HashMap<Uuid, JobTemplate>,
    jobs: HashMap<Uuid, Job>,
    runs: Vec<RunRecord>,
}

/// All three store traits over process memory
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every recorded run of `job_id`, in insertion order
    pub async fn runs_for(&self, job_id: Uuid) -> Vec<RunRecord> {
        let tables = self.tables.read().await;
        tables
            .runs
            .iter()
            .filter(|r| r.job_id == job_id)
            .cloned()
            .collect()
    }

    pub async fn job_count(&self) -> usize {
        self.tables.read().await.jobs.len()
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn find_due(
        &self,
        now: DateTime<Utc>,
        horizon: DateTime<Utc>,
    ) -> Result<Vec<Job>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .jobs
            .values()
            .filter(|job| job.window.is_selectable(now, horizon))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Job>, StoreError> {
        Ok(self.tables.read().await.jobs.get(&id).cloned())
    }

    async fn update_window(&self, id: Uuid, window: RunWindow) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let job = tables
            .jobs
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("Job not found: {}", id)))?;
        job.window = window;
        Ok(())
    }

    async fn insert(&self, job: &Job) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.templates.contains_key(&job.template_id) {
            return Err(StoreError::NotFound(format!(
                "Template not found: {}",
                job.template_id
            )));
        }
        if tables.jobs.contains_key(&job.id) {
            return Err(StoreError::DuplicateKey(format!("Job already exists: {}", job.id)));
        }
        tables.jobs.insert(job.id, job.clone());
        Ok(())
    }
}

#[async_trait]
impl TemplateStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<JobTemplate>, StoreError> {
        Ok(self.tables.read().await.templates.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<JobTemplate>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .templates
            .values()
            .find(|t| t.name.as_deref() == Some(name))
            .cloned())
    }

    async fn insert(&self, template: &JobTemplate) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(name) = &template.name {
            if tables.templates.values().any(|t| t.name.as_ref() == Some(name)) {
                return Err(StoreError::DuplicateKey(format!(
                    "Template name already exists: {}",
                    name
                )));
            }
        }
        tables.templates.insert(template.id, template.clone());
        Ok(())
    }
}

#[async_trait]
impl RunStore for MemoryStore {
    async fn recent_runs(&self, job_id: Uuid, limit: usize) -> Result<Vec<RunRecord>, StoreError> {
        let tables = self.tables.read().await;
        let mut runs: Vec<RunRecord> = tables
            .runs
            .iter()
            .filter(|r| r.job_id == job_id)
            .cloned()
            .collect();
        runs.sort_by(|a, b| b.run_at.cmp(&a.run_at));
        runs.truncate(limit);
        Ok(runs)
    }

    async fn insert_run(&self, record: &RunRecord) -> Result<(), StoreError> {
        self.tables.write().await.runs.push(record.clone());
        Ok(())
    }
}
