// Result marker: records each run and moves the job's window forward

use crate::models::{JobResult, RunRecord, RunWindow};
use crate::queue::ResultReceiver;
use crate::scheduler::in_flight::InFlight;
use crate::scheduler::window::{next_window, HISTORY_DEPTH};
use crate::store::{JobStore, RunStore};
use crate::telemetry;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info, instrument};

/// What happened while marking one result
#[derive(Debug, Clone, PartialEq)]
pub struct MarkReport {
    pub window: RunWindow,
    pub window_persisted: bool,
    pub history_persisted: bool,
}

/// Single sequential consumer of the result queue
///
/// The window update and the history insert are two separate writes. A
/// crash between them keeps the new window and loses that run's record.
#[derive(Clone)]
pub struct ResultMarker {
    jobs: Arc<dyn JobStore>,
    runs: Arc<dyn RunStore>,
    in_flight: Option<InFlight>,
}

impl ResultMarker {
    pub fn new(jobs: Arc<dyn JobStore>, runs: Arc<dyn RunStore>) -> Self {
        Self {
            jobs,
            runs,
            in_flight: None,
        }
    }

    /// Release each job from `in_flight` once it has been marked
    pub fn with_in_flight(mut self, in_flight: InFlight) -> Self {
        self.in_flight = Some(in_flight);
        self
    }

    pub async fn mark(&self, result: &JobResult) -> MarkReport {
        self.mark_at(result, Utc::now()).await
    }

    /// Mark `result` as having run at `now`
    ///
    /// Store failures are logged and counted; both writes are always attempted.
    #[instrument(skip(self, result), fields(job_id = %result.job.id, success = result.is_success()))]
    pub async fn mark_at(&self, result: &JobResult, now: DateTime<Utc>) -> MarkReport {
        let job = &result.job;

        let recent = match self.runs.recent_runs(job.id, HISTORY_DEPTH).await {
            Ok(runs) => runs.into_iter().map(|r| r.run_at).collect::<Vec<_>>(),
            Err(e) => {
                error!(error = %e, "Could not load recent runs, using short-history window");
                telemetry::record_persistence_failure("history");
                Vec::new()
            }
        };

        let window = next_window(job.interval, now, &recent);
        info!(next_min = %window.min, next_max = %window.max, "Calculated next run window");

        let window_persisted = match self.jobs.update_window(job.id, window).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Failed to update job window");
                telemetry::record_persistence_failure("window");
                false
            }
        };

        let record = RunRecord {
            job_id: job.id,
            run_at: now,
            success: result.is_success(),
            diagnostics: result.diagnostics.clone(),
        };
        let history_persisted = match self.runs.insert_run(&record).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Failed to insert job run");
                telemetry::record_persistence_failure("history");
                false
            }
        };

        telemetry::record_run(result.template_type.as_str(), result.is_success());

        if let Some(in_flight) = &self.in_flight {
            in_flight.release(job.id).await;
        }

        MarkReport {
            window,
            window_persisted,
            history_persisted,
        }
    }

    /// Consume results in arrival order until the result queue closes
    pub async fn run(self, mut results: ResultReceiver) {
        info!("Starting job marker");

        while let Some(result) = results.recv().await {
            self.mark(&result).await;
        }

        info!("Job marker finished");
    }
}
