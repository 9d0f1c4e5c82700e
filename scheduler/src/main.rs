// Scheduler binary entry point

use anyhow::Context;
use common::bootstrap;
use common::scheduler::{Scheduler, SchedulerEngine};
use common::telemetry;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = bootstrap::load_settings()?;

    telemetry::init_logging(
        &settings.observability.log_level,
        settings.observability.tracing_endpoint.as_deref(),
    )?;
    telemetry::init_metrics(settings.observability.metrics_port)?;

    info!(
        tick_interval_seconds = settings.scheduler.tick_interval_seconds,
        lookahead_seconds = settings.scheduler.lookahead_seconds,
        "Starting Cadence scheduler"
    );

    let db_pool = bootstrap::init_database_pool(&settings).await?;
    let stores = bootstrap::postgres_stores(&db_pool);
    let registry = bootstrap::init_executor_registry(&settings.executor).await?;

    let scheduler = Arc::new(SchedulerEngine::new(
        settings.scheduler.clone(),
        stores,
        registry,
    ));

    let scheduler_for_shutdown = scheduler.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            return;
        }
        info!("Received Ctrl+C signal, initiating graceful shutdown");
        if let Err(e) = scheduler_for_shutdown.stop().await {
            error!(error = %e, "Error during scheduler shutdown");
        }
    });

    scheduler.start().await.context("Scheduler error")?;

    db_pool.close().await;
    telemetry::shutdown_tracer();
    info!("Scheduler stopped");
    Ok(())
}
