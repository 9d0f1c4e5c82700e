// Template resolver with an optional in-process cache

use crate::errors::StoreError;
use crate::models::JobTemplate;
use crate::store::TemplateStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Loads templates by id; templates never change after creation, so hits
/// may be served from memory
pub struct TemplateResolver {
    templates: Arc<dyn TemplateStore>,
    cache: Option<RwLock<HashMap<Uuid, JobTemplate>>>,
}

impl TemplateResolver {
    pub fn new(templates: Arc<dyn TemplateStore>) -> Self {
        Self {
            templates,
            cache: None,
        }
    }

    pub fn with_cache(templates: Arc<dyn TemplateStore>) -> Self {
        Self {
            templates,
            cache: Some(RwLock::new(HashMap::new())),
        }
    }

    #[instrument(skip(self))]
    pub async fn resolve(&self, template_id: Uuid) -> Result<JobTemplate, StoreError> {
        if let Some(cache) = &self.cache {
            if let Some(template) = cache.read().await.get(&template_id) {
                debug!("Template served from cache");
                return Ok(template.clone());
            }
        }

        let template = self
            .templates
            .find_by_id(template_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("Template not found: {}", template_id)))?;

        if let Some(cache) = &self.cache {
            cache.write().await.insert(template_id, template.clone());
        }

        Ok(template)
    }
}
