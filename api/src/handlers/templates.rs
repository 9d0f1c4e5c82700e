use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;

use crate::handlers::{CreatedResponse, ErrorResponse};
use crate::state::AppState;
use common::errors::StoreError;
use common::models::{JobTemplate, TemplateType};

/// Request to register a template
#[derive(Debug, Deserialize)]
pub struct CreateTemplateRequest {
    #[serde(rename = "type")]
    pub template_type: TemplateType,
    pub name: Option<String>,
    #[serde(default)]
    pub props: serde_json::Value,
}

impl CreateTemplateRequest {
    fn into_template(self) -> Result<JobTemplate, ErrorResponse> {
        let name = self.name.filter(|n| !n.trim().is_empty());
        Ok(JobTemplate::new(self.template_type, name, self.props)?)
    }
}

/// Create a template
#[tracing::instrument(skip(state, body))]
pub async fn create_template(
    State(state): State<AppState>,
    body: Result<Json<CreateTemplateRequest>, JsonRejection>,
) -> Result<CreatedResponse, ErrorResponse> {
    let Json(req) = body?;
    let template = req.into_template()?;

    match state.templates.insert(&template).await {
        Ok(()) => {}
        Err(StoreError::DuplicateKey(_)) => {
            return Err(ErrorResponse::validation(format!(
                "Template name '{}' is already taken",
                template.name.as_deref().unwrap_or_default()
            )));
        }
        Err(e) => return Err(e.into()),
    }

    tracing::info!(
        template_id = %template.id,
        template_type = %template.template_type,
        name = ?template.name,
        "Template created"
    );

    Ok(CreatedResponse { id: template.id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: serde_json::Value) -> CreateTemplateRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_remote_function_accepts_name_alias() {
        let template = request(json!({"type": "remote-function", "props": {"name": "f1"}}))
            .into_template()
            .unwrap();
        assert_eq!(template.template_type, TemplateType::RemoteFunction);
        assert!(template.name.is_none());
    }

    #[test]
    fn test_unknown_type_rejected() {
        let err = request(json!({"type": "ftp", "props": {}}))
            .into_template()
            .unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_http_requires_method() {
        let err = request(json!({"type": "http", "props": {"url": "http://x"}}))
            .into_template()
            .unwrap_err();
        assert_eq!(err.error, "validation_error");
    }

    #[test]
    fn test_blank_name_treated_as_absent() {
        let template = request(json!({
            "type": "http",
            "name": "  ",
            "props": {"method": "GET", "url": "http://x"}
        }))
        .into_template()
        .unwrap();
        assert!(template.name.is_none());
    }
}
