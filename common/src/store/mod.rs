// Store abstraction used by the scheduling core
//
// The core only talks to persistence through these traits; the Postgres
// repositories and the in-memory store both implement them.

pub mod memory;

use crate::errors::StoreError;
use crate::models::{Job, JobTemplate, RunRecord, RunWindow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

pub use memory::MemoryStore;

/// Job persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Jobs whose window overlaps `[now, horizon]` or lies entirely before `now`
    async fn find_due(
        &self,
        now: DateTime<Utc>,
        horizon: DateTime<Utc>,
    ) -> Result<Vec<Job>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Job>, StoreError>;

    async fn update_window(&self, id: Uuid, window: RunWindow) -> Result<(), StoreError>;

    async fn insert(&self, job: &Job) -> Result<(), StoreError>;
}

/// Template persistence; templates are never mutated after insert
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<JobTemplate>, StoreError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<JobTemplate>, StoreError>;

    async fn insert(&self, template: &JobTemplate) -> Result<(), StoreError>;
}

/// Append-only run history
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RunStore: Send + Sync {
    /// Up to `limit` most recent runs of `job_id`, most recent first
    async fn recent_runs(&self, job_id: Uuid, limit: usize) -> Result<Vec<RunRecord>, StoreError>;

    async fn insert_run(&self, record: &RunRecord) -> Result<(), StoreError>;
}

/// The three stores handed to the scheduling core and the API
#[derive(Clone)]
pub struct Stores {
    pub jobs: Arc<dyn JobStore>,
    pub templates: Arc<dyn TemplateStore>,
    pub runs: Arc<dyn RunStore>,
}

impl Stores {
    /// Back every store with one shared in-memory store
    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            jobs: store.clone(),
            templates: store.clone(),
            runs: store,
        }
    }
}
