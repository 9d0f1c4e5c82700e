// Scheduler engine: periodic driver of the find → resolve → dispatch cycle

use crate::config::SchedulerConfig;
use crate::errors::SchedulerError;
use crate::executor::ExecutorRegistry;
use crate::models::RunnableJob;
use crate::queue::{DispatchSender, QueueCapacities};
use crate::scheduler::finder::DueJobFinder;
use crate::scheduler::in_flight::InFlight;
use crate::scheduler::marker::ResultMarker;
use crate::scheduler::pipeline::{Pipeline, PipelineHandle};
use crate::scheduler::resolver::TemplateResolver;
use crate::store::Stores;
use crate::telemetry;
use crate::worker::ExecutionWorker;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

/// Scheduler trait for job scheduling operations
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Start the pipeline and tick until `stop` is called, then drain
    async fn start(&self) -> Result<(), SchedulerError>;

    /// Signal the tick loop to stop
    async fn stop(&self) -> Result<(), SchedulerError>;

    /// One find → resolve → dispatch pass; returns the number of jobs dispatched
    async fn run_cycle(&self, dispatch: &DispatchSender) -> Result<usize, SchedulerError>;
}

/// Main scheduler engine implementation
pub struct SchedulerEngine {
    config: SchedulerConfig,
    finder: DueJobFinder,
    resolver: TemplateResolver,
    in_flight: Option<InFlight>,
    worker: ExecutionWorker,
    marker: ResultMarker,
    running: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
}

impl SchedulerEngine {
    pub fn new(config: SchedulerConfig, stores: Stores, registry: ExecutorRegistry) -> Self {
        let finder = DueJobFinder::new(stores.jobs.clone(), config.lookahead());
        let resolver = if config.cache_templates {
            TemplateResolver::with_cache(stores.templates.clone())
        } else {
            TemplateResolver::new(stores.templates.clone())
        };

        let in_flight = config.skip_in_flight.then(InFlight::new);
        let mut marker = ResultMarker::new(stores.jobs, stores.runs);
        if let Some(in_flight) = &in_flight {
            marker = marker.with_in_flight(in_flight.clone());
        }
        let worker = ExecutionWorker::new(registry);

        let (shutdown_tx, _shutdown_rx) = watch::channel(false);

        Self {
            config,
            finder,
            resolver,
            in_flight,
            worker,
            marker,
            running: AtomicBool::new(false),
            shutdown_tx,
        }
    }

    /// Only one pipeline may be live at a time
    fn spawn_pipeline(&self) -> Result<(DispatchSender, PipelineHandle), SchedulerError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(SchedulerError::AlreadyStarted);
        }
        Ok(Pipeline::spawn(
            self.worker.clone(),
            self.marker.clone(),
            QueueCapacities::from(&self.config),
        ))
    }

    async fn drain_pipeline(&self, dispatch: DispatchSender, pipeline: PipelineHandle) {
        drop(dispatch);
        pipeline.join().await;
        // Both tasks have exited, so any claim left behind belongs to a task that died
        if let Some(in_flight) = &self.in_flight {
            if !in_flight.is_empty().await {
                let stale_claims = in_flight.len().await;
                warn!(stale_claims, "Releasing claims left by a failed pipeline task");
                in_flight.clear().await;
            }
        }
        self.running.store(false, Ordering::SeqCst);
    }

    /// Run a single cycle and wait for every dispatched job to be marked
    pub async fn run_once(&self) -> Result<usize, SchedulerError> {
        let (dispatch, pipeline) = self.spawn_pipeline()?;
        let outcome = self.run_cycle(&dispatch).await;
        self.drain_pipeline(dispatch, pipeline).await;
        outcome
    }

    /// Jobs currently between dispatch and marking
    pub async fn in_flight_count(&self) -> usize {
        match &self.in_flight {
            Some(in_flight) => in_flight.len().await,
            None => 0,
        }
    }
}

#[async_trait]
impl Scheduler for SchedulerEngine {
    #[instrument(skip(self))]
    async fn start(&self) -> Result<(), SchedulerError> {
        info!(
            tick_interval_seconds = self.config.tick_interval_seconds,
            lookahead_seconds = self.config.lookahead_seconds,
            "Starting scheduler engine"
        );

        let (dispatch, pipeline) = self.spawn_pipeline()?;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        // First tick fires immediately
        let mut ticker = interval(self.config.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {
                    match self.run_cycle(&dispatch).await {
                        Ok(count) if count > 0 => info!(jobs_dispatched = count, "Dispatched due jobs"),
                        Ok(_) => debug!("No jobs due for execution"),
                        Err(SchedulerError::QueueClosed) => {
                            error!("Dispatch queue closed, stopping scheduler");
                            break;
                        }
                        Err(e) => error!(error = %e, "Scheduling cycle skipped"),
                    }
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping scheduler");
                        break;
                    }
                }
            }
        }

        self.drain_pipeline(dispatch, pipeline).await;
        self.shutdown_tx.send_replace(false);

        info!("Scheduler engine stopped");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn stop(&self) -> Result<(), SchedulerError> {
        info!("Stopping scheduler engine");
        self.shutdown_tx.send_replace(true);
        Ok(())
    }

    #[instrument(skip(self, dispatch))]
    async fn run_cycle(&self, dispatch: &DispatchSender) -> Result<usize, SchedulerError> {
        let now = Utc::now();
        let horizon = self.finder.horizon(now);

        let jobs = match self.finder.find_at(now, horizon).await {
            Ok(jobs) => jobs,
            Err(e) => {
                error!(error = %e, "Could not retrieve jobs to run");
                telemetry::record_cycle_failure("find");
                return Err(e.into());
            }
        };

        info!(job_count = jobs.len(), "Running due jobs");

        let mut dispatched = 0;
        for job in jobs {
            if let Some(in_flight) = &self.in_flight {
                if !in_flight.try_claim(job.id).await {
                    debug!(job_id = %job.id, "Job already in flight, skipping");
                    continue;
                }
            }

            let template = match self.resolver.resolve(job.template_id).await {
                Ok(template) => template,
                Err(e) => {
                    warn!(
                        job_id = %job.id,
                        template_id = %job.template_id,
                        error = %e,
                        "Could not resolve job template, skipping job this cycle"
                    );
                    telemetry::record_cycle_failure("resolve");
                    if let Some(in_flight) = &self.in_flight {
                        in_flight.release(job.id).await;
                    }
                    continue;
                }
            };

            let job_id = job.id;
            if dispatch
                .send(RunnableJob { job, template })
                .await
                .is_err()
            {
                if let Some(in_flight) = &self.in_flight {
                    in_flight.release(job_id).await;
                }
                return Err(SchedulerError::QueueClosed);
            }
            dispatched += 1;
        }

        telemetry::record_cycle_dispatched(dispatched);
        Ok(dispatched)
    }
}
