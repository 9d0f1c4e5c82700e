// HTTP job executor implementation

use crate::errors::ExecutionError;
use crate::executor::JobExecutor;
use crate::models::{ExecutionOutcome, GenericErrorMessage, HttpMethod, HttpProps, Job, JobTemplate};
use crate::substitution::{payload_variables, PlaceholderSubstitutor};
use async_trait::async_trait;
use reqwest::{Client, Method};
use std::time::Duration;

/// HttpExecutor calls an endpoint whose URL is filled in from the job payload
pub struct HttpExecutor {
    client: Client,
    substitutor: PlaceholderSubstitutor,
}

impl HttpExecutor {
    /// Create a new HttpExecutor; `timeout` of `None` leaves requests unbounded
    pub fn new(timeout: Option<Duration>) -> Result<Self, ExecutionError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            ExecutionError::HttpRequestFailed(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            substitutor: PlaceholderSubstitutor::new(),
        })
    }

    fn convert_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Head => Method::HEAD,
        }
    }

    /// Target URL with every known `:name` placeholder replaced
    pub fn build_url(&self, props: &HttpProps, payload: &serde_json::Value) -> String {
        self.substitutor.substitute(&props.url, &payload_variables(payload))
    }

    #[tracing::instrument(skip(self))]
    async fn send(&self, method: HttpMethod, url: &str) -> Result<Vec<u8>, ExecutionError> {
        let response = self
            .client
            .request(Self::convert_method(method), url)
            .send()
            .await
            .map_err(|e| ExecutionError::HttpRequestFailed(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = url, status = status.as_u16(), "HTTP target answered with non-success status");
        } else {
            tracing::debug!(url = url, status = status.as_u16(), "HTTP response received");
        }

        let body = response.bytes().await.map_err(|e| {
            ExecutionError::HttpRequestFailed(format!("Failed to read response body: {}", e))
        })?;

        Ok(body.to_vec())
    }
}

#[async_trait]
impl JobExecutor for HttpExecutor {
    #[tracing::instrument(skip(self, job, template), fields(job_id = %job.id, template_id = %template.id))]
    async fn execute(&self, job: &Job, template: &JobTemplate) -> ExecutionOutcome {
        let props: HttpProps = match template.props() {
            Ok(props) => props,
            Err(e) => {
                tracing::error!(error = %e, "Cannot decode HTTP template properties");
                let diagnostics = GenericErrorMessage::to_bytes(e.to_string());
                return ExecutionOutcome::failure(e, diagnostics);
            }
        };

        let url = self.build_url(&props, &job.payload);
        tracing::info!(method = ?props.method, url = %url, "Executing HTTP invocation");

        match self.send(props.method, &url).await {
            Ok(body) => ExecutionOutcome::success(body),
            Err(e) => {
                tracing::error!(error = %e, url = %url, "HTTP invocation failed");
                ExecutionOutcome::failure(e, Vec::new())
            }
        }
    }
}
