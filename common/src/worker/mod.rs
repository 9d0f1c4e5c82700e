// Execution worker: drains the dispatch queue and produces one result per job

use crate::executor::ExecutorRegistry;
use crate::models::{JobResult, RunnableJob};
use crate::queue::{DispatchReceiver, ResultSender};
use crate::telemetry;
use std::time::Instant;
use tracing::{error, info, instrument};

/// Single sequential consumer of the dispatch queue
#[derive(Clone)]
pub struct ExecutionWorker {
    registry: ExecutorRegistry,
}

impl ExecutionWorker {
    pub fn new(registry: ExecutorRegistry) -> Self {
        Self { registry }
    }

    /// Invoke the backend for one job; never fails, errors land in the result
    #[instrument(skip(self, runnable), fields(job_id = %runnable.job.id, template_type = %runnable.template.template_type))]
    pub async fn execute(&self, runnable: RunnableJob) -> JobResult {
        let RunnableJob { job, template } = runnable;

        let started = Instant::now();
        let outcome = self.registry.execute(&job, &template).await;
        telemetry::record_invocation_duration(
            template.template_type.as_str(),
            started.elapsed().as_secs_f64(),
        );

        if let Some(err) = &outcome.error {
            info!(error = %err, "Job invocation finished with error");
        } else {
            info!("Job invocation finished");
        }

        JobResult::new(job, template.template_type, outcome)
    }

    /// Consume jobs in arrival order until the dispatch queue closes
    pub async fn run(self, mut jobs: DispatchReceiver, results: ResultSender) {
        info!("Starting execution worker");

        while let Some(runnable) = jobs.recv().await {
            let result = self.execute(runnable).await;
            if results.send(result).await.is_err() {
                error!("Result queue closed, stopping execution worker");
                break;
            }
        }

        info!("Execution worker finished");
    }
}
