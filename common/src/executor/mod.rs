// Executor module for job execution
// Provides the shared invocation capability and one implementation per template type

pub mod http;
pub mod remote_function;

use crate::models::{ExecutionOutcome, Job, JobTemplate, TemplateType};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

pub use http::HttpExecutor;
pub use remote_function::{FunctionInvoker, InvocationResponse, LambdaInvoker, RemoteFunctionExecutor};

/// JobExecutor invokes a backend with a job's payload
///
/// Failures are part of the outcome, never a returned error, so that every
/// dispatched job produces exactly one result.
#[async_trait]
pub trait JobExecutor: Send + Sync {
    async fn execute(&self, job: &Job, template: &JobTemplate) -> ExecutionOutcome;
}

/// Maps template types to their executor
#[derive(Clone, Default)]
pub struct ExecutorRegistry {
    executors: HashMap<TemplateType, Arc<dyn JobExecutor>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, template_type: TemplateType, executor: Arc<dyn JobExecutor>) -> Self {
        self.executors.insert(template_type, executor);
        self
    }

    pub fn get(&self, template_type: &TemplateType) -> Option<&Arc<dyn JobExecutor>> {
        self.executors.get(template_type)
    }

    /// Run the executor registered for the template's type
    ///
    /// Types with no registered executor succeed with empty diagnostics.
    pub async fn execute(&self, job: &Job, template: &JobTemplate) -> ExecutionOutcome {
        match self.get(&template.template_type) {
            Some(executor) => executor.execute(job, template).await,
            None => {
                tracing::debug!(
                    job_id = %job.id,
                    template_type = %template.template_type,
                    "No executor registered for template type, skipping invocation"
                );
                ExecutionOutcome::success(Vec::new())
            }
        }
    }
}
