// Bootstrap utilities for binary initialization, shared by the scheduler and API mains

use crate::config::{ExecutorConfig, Settings};
use crate::db::repositories::{JobRepository, RunRepository, TemplateRepository};
use crate::db::DbPool;
use crate::executor::{ExecutorRegistry, HttpExecutor, LambdaInvoker, RemoteFunctionExecutor};
use crate::models::TemplateType;
use crate::store::Stores;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// Initialize database pool, applying migrations when configured
///
/// # Errors
/// Returns error if the pool cannot connect or a migration fails
#[tracing::instrument(skip(settings))]
pub async fn init_database_pool(settings: &Settings) -> Result<DbPool> {
    info!("Initializing database pool");

    let db_pool = DbPool::new(&settings.database)
        .await
        .context("Failed to initialize database pool")?;

    if settings.database.run_migrations {
        db_pool
            .run_migrations()
            .await
            .context("Failed to run database migrations")?;
    }

    info!("Database pool initialized");
    Ok(db_pool)
}

/// Postgres-backed stores sharing one pool
pub fn postgres_stores(db_pool: &DbPool) -> Stores {
    Stores {
        jobs: Arc::new(JobRepository::new(db_pool.clone())),
        templates: Arc::new(TemplateRepository::new(db_pool.clone())),
        runs: Arc::new(RunRepository::new(db_pool.clone())),
    }
}

/// Register the HTTP and remote-function executors
///
/// # Errors
/// Returns error if the HTTP client cannot be built
#[tracing::instrument(skip(config))]
pub async fn init_executor_registry(config: &ExecutorConfig) -> Result<ExecutorRegistry> {
    info!(
        http_timeout_seconds = ?config.http_timeout_seconds,
        status_policy = ?config.status_policy,
        "Initializing executors"
    );

    let http = HttpExecutor::new(config.http_timeout()).context("Failed to create HTTP executor")?;
    let invoker = LambdaInvoker::from_env(config.aws_region.clone()).await;
    let remote = RemoteFunctionExecutor::new(Arc::new(invoker), config.status_policy);

    Ok(ExecutorRegistry::new()
        .register(TemplateType::Http, Arc::new(http))
        .register(TemplateType::RemoteFunction, Arc::new(remote)))
}

/// Load settings from `config/` and environment, then validate them
///
/// # Errors
/// Returns error if loading or validation fails
pub fn load_settings() -> Result<Settings> {
    let settings = Settings::load().context("Failed to load configuration")?;
    settings
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_registry_covers_both_template_types() {
        let registry = init_executor_registry(&ExecutorConfig {
            aws_region: Some("eu-west-1".to_string()),
            ..ExecutorConfig::default()
        })
        .await
        .unwrap();

        assert!(registry.get(&TemplateType::Http).is_some());
        assert!(registry.get(&TemplateType::RemoteFunction).is_some());
        assert!(registry.get(&TemplateType::Other("x".to_string())).is_none());
    }
}
