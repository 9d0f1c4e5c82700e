// Remote function executor backed by AWS Lambda

use crate::config::StatusPolicy;
use crate::errors::ExecutionError;
use crate::executor::JobExecutor;
use crate::models::{ExecutionOutcome, GenericErrorMessage, Job, JobTemplate, RemoteFunctionProps};
use async_trait::async_trait;
use aws_sdk_lambda::error::DisplayErrorContext;
use aws_sdk_lambda::primitives::Blob;
use serde::Serialize;
use std::sync::Arc;

/// Response of a synchronous function invocation, kept as diagnostics when
/// the status code marks the run as failed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvocationResponse {
    pub status_code: i32,
    pub function_error: Option<String>,
    pub executed_version: Option<String>,
    pub log_result: Option<String>,
    pub payload: Option<serde_json::Value>,
}

impl InvocationResponse {
    /// Decode a raw response payload, falling back to a string when it is not JSON
    pub fn decode_payload(bytes: &[u8]) -> serde_json::Value {
        serde_json::from_slice(bytes)
            .unwrap_or_else(|_| serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned()))
    }

    pub fn is_failure(&self, policy: StatusPolicy) -> bool {
        match policy {
            StatusPolicy::LastDigit => self.status_code.rem_euclid(10) > 2,
            StatusPolicy::SuccessRange => {
                !(200..=299).contains(&self.status_code) || self.function_error.is_some()
            }
        }
    }
}

/// Seam between the executor and the function runtime
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FunctionInvoker: Send + Sync {
    /// Invoke `function_name` synchronously with a JSON payload
    async fn invoke(
        &self,
        function_name: &str,
        payload: Vec<u8>,
    ) -> Result<InvocationResponse, ExecutionError>;
}

/// FunctionInvoker over the AWS Lambda API
pub struct LambdaInvoker {
    client: aws_sdk_lambda::Client,
}

impl LambdaInvoker {
    pub fn new(client: aws_sdk_lambda::Client) -> Self {
        Self { client }
    }

    /// Build a client from the ambient AWS configuration chain
    pub async fn from_env(region: Option<String>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region));
        }
        let config = loader.load().await;
        tracing::info!(region = ?config.region(), "Lambda client initialized");
        Self::new(aws_sdk_lambda::Client::new(&config))
    }
}

#[async_trait]
impl FunctionInvoker for LambdaInvoker {
    #[tracing::instrument(skip(self, payload), fields(payload_len = payload.len()))]
    async fn invoke(
        &self,
        function_name: &str,
        payload: Vec<u8>,
    ) -> Result<InvocationResponse, ExecutionError> {
        let output = self
            .client
            .invoke()
            .function_name(function_name)
            .payload(Blob::new(payload))
            .send()
            .await
            .map_err(|e| ExecutionError::RemoteInvocationFailed(DisplayErrorContext(&e).to_string()))?;

        Ok(InvocationResponse {
            status_code: output.status_code(),
            function_error: output.function_error().map(str::to_string),
            executed_version: output.executed_version().map(str::to_string),
            log_result: output.log_result().map(str::to_string),
            payload: output
                .payload()
                .map(|blob| InvocationResponse::decode_payload(blob.as_ref())),
        })
    }
}

/// Executes remote-function templates through a FunctionInvoker
pub struct RemoteFunctionExecutor {
    invoker: Arc<dyn FunctionInvoker>,
    policy: StatusPolicy,
}

impl RemoteFunctionExecutor {
    pub fn new(invoker: Arc<dyn FunctionInvoker>, policy: StatusPolicy) -> Self {
        Self { invoker, policy }
    }
}

#[async_trait]
impl JobExecutor for RemoteFunctionExecutor {
    #[tracing::instrument(skip(self, job, template), fields(job_id = %job.id, template_id = %template.id))]
    async fn execute(&self, job: &Job, template: &JobTemplate) -> ExecutionOutcome {
        let props: RemoteFunctionProps = match template.props() {
            Ok(props) => props,
            Err(e) => {
                tracing::error!(error = %e, "Cannot decode remote function template properties");
                let diagnostics = GenericErrorMessage::to_bytes(e.to_string());
                return ExecutionOutcome::failure(e, diagnostics);
            }
        };

        let payload = match serde_json::to_vec(&job.payload) {
            Ok(bytes) => bytes,
            Err(e) => {
                let err = ExecutionError::PayloadSerialization(e.to_string());
                let diagnostics = GenericErrorMessage::to_bytes(err.to_string());
                return ExecutionOutcome::failure(err, diagnostics);
            }
        };

        let response = match self.invoker.invoke(&props.function_name, payload).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(function_name = %props.function_name, error = %e, "Remote function invocation failed");
                let diagnostics = GenericErrorMessage::to_bytes(e.to_string());
                return ExecutionOutcome::failure(e, diagnostics);
            }
        };

        if !response.is_failure(self.policy) {
            tracing::debug!(
                function_name = %props.function_name,
                status_code = response.status_code,
                "Remote function invocation succeeded"
            );
            return ExecutionOutcome::success(Vec::new());
        }

        tracing::warn!(
            function_name = %props.function_name,
            status_code = response.status_code,
            function_error = ?response.function_error,
            "Remote function reported failure status"
        );
        let diagnostics = serde_json::to_vec(&response).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Could not serialize invocation response");
            Vec::new()
        });
        ExecutionOutcome::failure(
            ExecutionError::SoftFailure {
                function_name: props.function_name,
                status_code: response.status_code,
            },
            diagnostics,
        )
    }
}
