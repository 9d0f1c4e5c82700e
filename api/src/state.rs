use std::sync::Arc;

use common::config::Settings;
use common::store::{JobStore, Stores, TemplateStore};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub templates: Arc<dyn TemplateStore>,
    pub jobs: Arc<dyn JobStore>,
    pub config: Arc<Settings>,
}

impl AppState {
    pub fn new(stores: Stores, config: Settings) -> Self {
        Self {
            templates: stores.templates,
            jobs: stores.jobs,
            config: Arc::new(config),
        }
    }
}
