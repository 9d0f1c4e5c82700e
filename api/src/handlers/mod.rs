pub mod health;
pub mod jobs;
pub mod templates;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use common::errors::{StoreError, ValidationError};

/// Standard API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub trace_id: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            trace_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    pub fn unknown_template(template: &str) -> Self {
        Self::new("unknown_template", format!("Template '{}' does not exist", template))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }

    pub fn status(&self) -> StatusCode {
        match self.error.as_str() {
            "validation_error" | "invalid_json" => StatusCode::BAD_REQUEST,
            "unknown_template" => StatusCode::NOT_ACCEPTABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(trace_id = %self.trace_id, message = %self.message, "Request failed");
        } else {
            tracing::debug!(trace_id = %self.trace_id, error = %self.error, message = %self.message, "Request rejected");
        }
        (status, Json(self)).into_response()
    }
}

impl From<ValidationError> for ErrorResponse {
    fn from(err: ValidationError) -> Self {
        Self::validation(err.to_string())
    }
}

impl From<JsonRejection> for ErrorResponse {
    fn from(rejection: JsonRejection) -> Self {
        Self::new("invalid_json", rejection.body_text())
    }
}

impl From<StoreError> for ErrorResponse {
    fn from(err: StoreError) -> Self {
        Self::internal(err.to_string())
    }
}

/// Body returned for every created resource
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: Uuid,
}

impl IntoResponse for CreatedResponse {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, Json(self)).into_response()
    }
}
