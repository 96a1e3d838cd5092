//! Error types module
//!
//! Every failure of an upload is terminal for its session and is reported as one
//! `IngestError` variant. The HTTP layer reads the `ErrorMetadata` of a variant to
//! decide status, log level and what the client gets to see.

use crate::binding::ValidationErrors;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for malformed input from clients
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "STORAGE_ERROR")
    fn error_code(&self) -> &'static str;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden from clients
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Anti-forgery token rejected")]
    AntiforgeryRejected,

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Unexpected file part under field '{field}'")]
    UnexpectedFilePart { field: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
}

impl IngestError {
    pub fn malformed(message: impl Into<String>) -> Self {
        IngestError::MalformedRequest(message.into())
    }

    pub fn transport(err: impl std::fmt::Display) -> Self {
        IngestError::Transport(err.to_string())
    }

    /// Variant name, used as the `error_type` field in logs
    pub fn error_type(&self) -> &'static str {
        match self {
            IngestError::AntiforgeryRejected => "AntiforgeryRejected",
            IngestError::UnsupportedMediaType(_) => "UnsupportedMediaType",
            IngestError::MalformedRequest(_) => "MalformedRequest",
            IngestError::UnexpectedFilePart { .. } => "UnexpectedFilePart",
            IngestError::Transport(_) => "TransportError",
            IngestError::Storage(_) => "StorageError",
            IngestError::Validation(_) => "ValidationError",
        }
    }

    /// Field violations when this is a binding failure
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            IngestError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for IngestError {
    fn from(errors: ValidationErrors) -> Self {
        IngestError::Validation(errors)
    }
}

/// Static metadata for each variant: (http_status, error_code, sensitive, log_level).
fn ingest_error_static_metadata(err: &IngestError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        IngestError::AntiforgeryRejected => (400, "ANTIFORGERY_REJECTED", false, LogLevel::Debug),
        IngestError::UnsupportedMediaType(_) => {
            (415, "UNSUPPORTED_MEDIA_TYPE", false, LogLevel::Debug)
        }
        IngestError::MalformedRequest(_) => (400, "MALFORMED_REQUEST", false, LogLevel::Warn),
        IngestError::UnexpectedFilePart { .. } => {
            (400, "UNEXPECTED_FILE_PART", false, LogLevel::Warn)
        }
        IngestError::Transport(_) => (400, "TRANSPORT_ERROR", true, LogLevel::Error),
        IngestError::Storage(_) => (500, "STORAGE_ERROR", true, LogLevel::Error),
        IngestError::Validation(_) => (422, "VALIDATION_ERROR", false, LogLevel::Debug),
    }
}

impl ErrorMetadata for IngestError {
    fn http_status_code(&self) -> u16 {
        ingest_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        ingest_error_static_metadata(self).1
    }

    fn client_message(&self) -> String {
        match self {
            // Only binding failures are meant to be shown next to the form inputs.
            IngestError::Validation(errors) => {
                format!("{} field(s) failed validation", errors.len())
            }
            _ => "The request couldn't be processed".to_string(),
        }
    }

    fn is_sensitive(&self) -> bool {
        ingest_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        ingest_error_static_metadata(self).3
    }
}
