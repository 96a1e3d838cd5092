//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`; `IngestError` (or
//! anything convertible into it) becomes an `HttpAppError` with `?` and renders
//! with a consistent status, body and log level.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use upform_core::{ErrorMetadata, FieldError, IngestError, LogLevel};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Every field violation, for binding failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            error_type: None,
            code: code.into(),
            errors: None,
        }
    }
}

/// Wrapper type for IngestError to implement IntoResponse
/// (orphan rules: both the trait and the error type live in other crates)
#[derive(Debug)]
pub struct HttpAppError(pub IngestError);

impl From<IngestError> for HttpAppError {
    fn from(err: IngestError) -> Self {
        HttpAppError(err)
    }
}

fn log_error(error: &IngestError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Upload rejected");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Upload rejected");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Upload failed");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| env.to_lowercase() == "production" || env.to_lowercase() == "prod")
        .unwrap_or(false)
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let error = &self.0;
        let status = StatusCode::from_u16(error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(error);

        let mut body = ErrorResponse::new(error.client_message(), error.error_code());
        body.errors = error
            .validation_errors()
            .map(|errors| errors.iter().cloned().collect());

        // Details never leave the process in production or for sensitive errors.
        if !is_production_env() && !error.is_sensitive() {
            body.details = Some(error.to_string());
            body.error_type = Some(error.error_type().to_string());
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use upform_core::ValidationErrors;

    #[test]
    fn validation_errors_are_listed() {
        let mut errors = ValidationErrors::default();
        errors.push(FieldError::missing("Title"));
        errors.push(FieldError::missing("Category"));

        let response = HttpAppError::from(IngestError::Validation(errors)).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn storage_error_is_500() {
        let response =
            HttpAppError::from(IngestError::Storage("disk full".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
