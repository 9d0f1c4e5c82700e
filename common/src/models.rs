use crate::errors::{ExecutionError, ValidationError};
use crate::interval::RunInterval;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Scheduling window
// ============================================================================

/// Inclusive `[min, max]` range during which a job is considered due
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunWindow {
    pub min: DateTime<Utc>,
    pub max: DateTime<Utc>,
}

impl RunWindow {
    /// Build a window, swapping the bounds if they arrive reversed so that
    /// `min <= max` always holds.
    pub fn new(min: DateTime<Utc>, max: DateTime<Utc>) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// A job is due at `at` when `at` is inside the window or the window is past.
    pub fn is_due_at(&self, at: DateTime<Utc>) -> bool {
        self.max < at || (self.min <= at && at <= self.max)
    }

    /// Selection predicate of the due-job finder: the window overlaps
    /// `[now, horizon]`, or lies entirely before `now`.
    pub fn is_selectable(&self, now: DateTime<Utc>, horizon: DateTime<Utc>) -> bool {
        let overlaps = self.min <= horizon && self.max >= now;
        let overdue = self.max < now;
        overlaps || overdue
    }
}

// ============================================================================
// Job Models
// ============================================================================

/// Job represents a recurring invocation of a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub interval: RunInterval,
    pub template_id: Uuid,
    pub payload: serde_json::Value,
    pub path: Option<String>,
    pub window: RunWindow,
}

impl Job {
    /// Create a new job whose first window is `[now, now + interval]`
    pub fn new(
        template_id: Uuid,
        interval: RunInterval,
        payload: serde_json::Value,
        path: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            interval,
            template_id,
            payload,
            path,
            window: RunWindow::new(
                now,
                crate::scheduler::window::shift(now, interval.as_duration()),
            ),
        }
    }
}

/// Template types understood by the worker.
///
/// Unknown tags read back from the store are kept verbatim in `Other` so the
/// worker can treat them as a no-op instead of failing the cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TemplateType {
    RemoteFunction,
    Http,
    Other(String),
}

impl TemplateType {
    pub fn as_str(&self) -> &str {
        match self {
            TemplateType::RemoteFunction => "remote-function",
            TemplateType::Http => "http",
            TemplateType::Other(tag) => tag,
        }
    }

    /// Check that `properties` has the shape this type requires
    pub fn validate_properties(&self, properties: &serde_json::Value) -> Result<(), ValidationError> {
        match self {
            TemplateType::RemoteFunction => {
                let props: RemoteFunctionProps = serde_json::from_value(properties.clone())
                    .map_err(|_| ValidationError::MissingField("props.function_name".to_string()))?;
                if props.function_name.trim().is_empty() {
                    return Err(ValidationError::InvalidFieldValue {
                        field: "props.function_name".to_string(),
                        reason: "must not be empty".to_string(),
                    });
                }
                Ok(())
            }
            TemplateType::Http => {
                let props: HttpProps = serde_json::from_value(properties.clone())?;
                if props.url.trim().is_empty() {
                    return Err(ValidationError::InvalidFieldValue {
                        field: "props.url".to_string(),
                        reason: "must not be empty".to_string(),
                    });
                }
                Ok(())
            }
            TemplateType::Other(tag) => Err(ValidationError::UnknownTemplateType(tag.clone())),
        }
    }
}

impl FromStr for TemplateType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "remote-function" => TemplateType::RemoteFunction,
            "http" => TemplateType::Http,
            other => TemplateType::Other(other.to_string()),
        })
    }
}

impl fmt::Display for TemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TemplateType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TemplateType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let Ok(template_type) = raw.parse::<TemplateType>();
        Ok(template_type)
    }
}

/// JobTemplate is a reusable invocation definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobTemplate {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub template_type: TemplateType,
    pub name: Option<String>,
    pub properties: serde_json::Value,
}

impl JobTemplate {
    pub fn new(
        template_type: TemplateType,
        name: Option<String>,
        properties: serde_json::Value,
    ) -> Result<Self, ValidationError> {
        template_type.validate_properties(&properties)?;
        Ok(Self {
            id: Uuid::new_v4(),
            template_type,
            name,
            properties,
        })
    }

    /// Decode the configuration blob into the shape a given executor expects
    pub fn props<T: serde::de::DeserializeOwned>(&self) -> Result<T, ExecutionError> {
        serde_json::from_value(self.properties.clone()).map_err(|e| {
            ExecutionError::InvalidTemplateProperties(format!(
                "template {} ({}): {}",
                self.id, self.template_type, e
            ))
        })
    }
}

/// Configuration of a remote-function template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteFunctionProps {
    #[serde(alias = "name")]
    pub function_name: String,
}

/// Configuration of an HTTP template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpProps {
    pub method: HttpMethod,
    pub url: String,
}

/// HttpMethod represents HTTP request methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

// ============================================================================
// Pipeline messages
// ============================================================================

/// A job paired with its resolved template, built once per scheduling cycle
#[derive(Debug, Clone)]
pub struct RunnableJob {
    pub job: Job,
    pub template: JobTemplate,
}

/// What an executor produced for one invocation
#[derive(Debug, Default)]
pub struct ExecutionOutcome {
    pub error: Option<ExecutionError>,
    pub diagnostics: Vec<u8>,
}

impl ExecutionOutcome {
    pub fn success(diagnostics: Vec<u8>) -> Self {
        Self {
            error: None,
            diagnostics,
        }
    }

    pub fn failure(error: ExecutionError, diagnostics: Vec<u8>) -> Self {
        Self {
            error: Some(error),
            diagnostics,
        }
    }
}

/// Outcome of running a job, carried from the worker to the marker
#[derive(Debug)]
pub struct JobResult {
    pub job: Job,
    pub template_type: TemplateType,
    pub error: Option<ExecutionError>,
    pub diagnostics: Vec<u8>,
}

impl JobResult {
    pub fn new(job: Job, template_type: TemplateType, outcome: ExecutionOutcome) -> Self {
        Self {
            job,
            template_type,
            error: outcome.error,
            diagnostics: outcome.diagnostics,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// One row of run history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RunRecord {
    pub job_id: Uuid,
    pub run_at: DateTime<Utc>,
    pub success: bool,
    pub diagnostics: Vec<u8>,
}

/// Generic diagnostic body for errors that have no richer payload
#[derive(Debug, Serialize, Deserialize)]
pub struct GenericErrorMessage {
    pub message: String,
}

impl GenericErrorMessage {
    pub fn to_bytes(message: impl Into<String>) -> Vec<u8> {
        let body = GenericErrorMessage {
            message: message.into(),
        };
        serde_json::to_vec(&body).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn test_window_new_orders_bounds() {
        let now = Utc::now();
        let window = RunWindow::new(now + Duration::minutes(5), now);
        assert!(window.min <= window.max);
        assert_eq!(window.min, now);
    }

    #[test]
    fn test_window_due_inside_and_overdue() {
        let now = Utc::now();
        let inside = RunWindow::new(now - Duration::minutes(1), now + Duration::minutes(1));
        let past = RunWindow::new(now - Duration::hours(2), now - Duration::hours(1));
        let future = RunWindow::new(now + Duration::hours(1), now + Duration::hours(2));
        assert!(inside.is_due_at(now));
        assert!(past.is_due_at(now));
        assert!(!future.is_due_at(now));
    }

    #[test]
    fn test_window_selectable_within_horizon() {
        let now = Utc::now();
        let horizon = now + Duration::hours(2);
        let soon = RunWindow::new(now + Duration::minutes(30), now + Duration::minutes(40));
        let later = RunWindow::new(now + Duration::hours(3), now + Duration::hours(4));
        let point_in_past = RunWindow::new(now - Duration::seconds(1), now - Duration::seconds(1));
        assert!(soon.is_selectable(now, horizon));
        assert!(!later.is_selectable(now, horizon));
        assert!(point_in_past.is_selectable(now, now));
    }

    #[test]
    fn test_new_job_initial_window() {
        let now = Utc::now();
        let interval: RunInterval = "10m".parse().unwrap();
        let job = Job::new(Uuid::new_v4(), interval, json!({}), None, now);
        assert_eq!(job.window.min, now);
        assert_eq!(job.window.max, now + Duration::minutes(10));
    }

    #[test]
    fn test_template_type_round_trip_tags() {
        assert_eq!("remote-function".parse::<TemplateType>().unwrap(), TemplateType::RemoteFunction);
        assert_eq!("http".parse::<TemplateType>().unwrap(), TemplateType::Http);
        assert_eq!(
            "queue".parse::<TemplateType>().unwrap(),
            TemplateType::Other("queue".to_string())
        );
        assert_eq!(TemplateType::RemoteFunction.to_string(), "remote-function");
    }

    #[test]
    fn test_remote_function_requires_function_name() {
        let ty = TemplateType::RemoteFunction;
        assert!(ty.validate_properties(&json!({"function_name": "f1"})).is_ok());
        assert!(ty.validate_properties(&json!({"name": "f1"})).is_ok());
        assert!(ty.validate_properties(&json!({})).is_err());
        assert!(ty.validate_properties(&json!({"function_name": "  "})).is_err());
    }

    #[test]
    fn test_http_requires_method_and_url() {
        let ty = TemplateType::Http;
        assert!(ty
            .validate_properties(&json!({"method": "GET", "url": "http://x/:id"}))
            .is_ok());
        assert!(ty.validate_properties(&json!({"url": "http://x"})).is_err());
        assert!(ty
            .validate_properties(&json!({"method": "TRACE", "url": "http://x"}))
            .is_err());
        assert!(ty
            .validate_properties(&json!({"method": "POST", "url": ""}))
            .is_err());
    }

    #[test]
    fn test_unknown_type_rejected_at_creation() {
        let result = JobTemplate::new(TemplateType::Other("ftp".to_string()), None, json!({}));
        assert!(matches!(result, Err(ValidationError::UnknownTemplateType(_))));
    }

    #[test]
    fn test_template_props_decoding_error() {
        let template = JobTemplate {
            id: Uuid::new_v4(),
            template_type: TemplateType::Http,
            name: None,
            properties: json!({"url": 5}),
        };
        let result: Result<HttpProps, _> = template.props();
        assert!(matches!(result, Err(ExecutionError::InvalidTemplateProperties(_))));
    }

    #[test]
    fn test_generic_error_message_bytes() {
        let bytes = GenericErrorMessage::to_bytes("boom");
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value, json!({"message": "boom"}));
    }
}
