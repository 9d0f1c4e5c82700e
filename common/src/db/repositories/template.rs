// Job template repository implementation

use crate::db::DbPool;
use crate::errors::{DatabaseError, StoreError};
use crate::models::{JobTemplate, TemplateType};
use crate::store::TemplateStore;
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::Row;
use tracing::instrument;
use uuid::Uuid;

/// Repository for template rows; templates are insert-only
#[derive(Clone)]
pub struct TemplateRepository {
    pool: DbPool,
}

impl TemplateRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn template_from_row(row: &PgRow) -> Result<JobTemplate, DatabaseError> {
        let tag: String = row.try_get("template_type")?;
        let Ok(template_type) = tag.parse::<TemplateType>();

        Ok(JobTemplate {
            id: row.try_get("id")?,
            template_type,
            name: row.try_get("name")?,
            properties: row.try_get("properties")?,
        })
    }

    #[instrument(skip(self))]
    pub async fn find_template(&self, id: Uuid) -> Result<Option<JobTemplate>, DatabaseError> {
        let row = sqlx::query(
            "SELECT id, template_type, name, properties FROM job_templates WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool.pool())
        .await?;

        row.as_ref().map(Self::template_from_row).transpose()
    }

    #[instrument(skip(self))]
    pub async fn find_template_by_name(&self, name: &str) -> Result<Option<JobTemplate>, DatabaseError> {
        let row = sqlx::query(
            "SELECT id, template_type, name, properties FROM job_templates WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(self.pool.pool())
        .await?;

        row.as_ref().map(Self::template_from_row).transpose()
    }

    #[instrument(skip(self, template), fields(template_id = %template.id))]
    pub async fn create(&self, template: &JobTemplate) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO job_templates (id, template_type, name, properties)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(template.id)
        .bind(template.template_type.as_str())
        .bind(&template.name)
        .bind(&template.properties)
        .execute(self.pool.pool())
        .await?;

        tracing::info!(
            template_id = %template.id,
            template_type = %template.template_type,
            "Template created"
        );
        Ok(())
    }
}

#[async_trait]
impl TemplateStore for TemplateRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<JobTemplate>, StoreError> {
        Ok(self.find_template(id).await?)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<JobTemplate>, StoreError> {
        Ok(self.find_template_by_name(name).await?)
    }

    async fn insert(&self, template: &JobTemplate) -> Result<(), StoreError> {
        Ok(self.create(template).await?)
    }
}
