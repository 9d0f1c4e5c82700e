use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::handlers::{CreatedResponse, ErrorResponse};
use crate::state::AppState;
use common::errors::StoreError;
use common::interval::RunInterval;
use common::models::{Job, JobTemplate};

/// Request to schedule a job against an existing template
#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    /// Run interval, e.g. `"10m"` or `"1h30m"`
    pub interval: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Create a job without a routing path
#[tracing::instrument(skip(state, body))]
pub async fn create_job(
    State(state): State<AppState>,
    Path(template): Path<String>,
    body: Result<Json<CreateJobRequest>, JsonRejection>,
) -> Result<CreatedResponse, ErrorResponse> {
    let Json(req) = body?;
    submit(&state, &template, None, req).await
}

/// Create a job whose routing path is the URL suffix after `/jobs/`
#[tracing::instrument(skip(state, body))]
pub async fn create_job_at_path(
    State(state): State<AppState>,
    Path((template, path)): Path<(String, String)>,
    body: Result<Json<CreateJobRequest>, JsonRejection>,
) -> Result<CreatedResponse, ErrorResponse> {
    let Json(req) = body?;
    submit(&state, &template, routing_path(&path), req).await
}

/// `a/b/c` becomes `a.b.c`; an empty suffix means no path
pub fn routing_path(suffix: &str) -> Option<String> {
    let trimmed = suffix.trim_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.replace('/', "."))
    }
}

async fn submit(
    state: &AppState,
    template_ref: &str,
    path: Option<String>,
    req: CreateJobRequest,
) -> Result<CreatedResponse, ErrorResponse> {
    let interval: RunInterval = req.interval.parse()?;
    let template = lookup_template(state, template_ref)
        .await?
        .ok_or_else(|| ErrorResponse::unknown_template(template_ref))?;

    let job = Job::new(template.id, interval, req.payload, path, Utc::now());

    match state.jobs.insert(&job).await {
        Ok(()) => {}
        Err(StoreError::NotFound(_)) => return Err(ErrorResponse::unknown_template(template_ref)),
        Err(e) => return Err(e.into()),
    }

    tracing::info!(
        job_id = %job.id,
        template_id = %template.id,
        interval = %job.interval,
        path = ?job.path,
        "Job created"
    );

    Ok(CreatedResponse { id: job.id })
}

/// Resolve a template by id, falling back to its name
async fn lookup_template(
    state: &AppState,
    template_ref: &str,
) -> Result<Option<JobTemplate>, ErrorResponse> {
    if let Ok(id) = Uuid::parse_str(template_ref) {
        if let Some(template) = state.templates.find_by_id(id).await? {
            return Ok(Some(template));
        }
    }
    Ok(state.templates.find_by_name(template_ref).await?)
}
