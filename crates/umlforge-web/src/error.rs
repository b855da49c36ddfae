use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use umlforge_core::DesignModel;

/// JSON error body returned by every API route.
#[derive(Debug, Error, Serialize)]
#[error("{error}")]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Index of the change that failed in an edit batch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_change: Option<usize>,
    /// The model with the changes before `failed_change` applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uml_model: Option<Value>,
}

impl ApiError {
    pub fn bad_request(code: &'static str, error: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: error.into(),
            code,
            details: None,
            failed_change: None,
            uml_model: None,
        }
    }

    pub fn missing_model() -> Self {
        Self::bad_request("MISSING_MODEL", "UML model is required")
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Attaches the partially edited model and the failing change index.
    #[must_use]
    pub fn with_partial_model(mut self, failed_change: Option<usize>, model: &DesignModel) -> Self {
        self.failed_change = failed_change;
        self.uml_model = serde_json::to_value(model).ok();
        self
    }
}

impl From<umlforge_core::Error> for ApiError {
    fn from(err: umlforge_core::Error) -> Self {
        if err.is_client_error() {
            return Self::bad_request(err.code(), err.to_string());
        }
        tracing::error!("Request failed: {}", err);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: "Processing failed".to_string(),
            code: err.code(),
            details: Some(err.to_string()),
            failed_change: None,
            uml_model: None,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request("BAD_REQUEST", "Invalid request format or data")
            .with_details(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(&self)).into_response()
    }
}
