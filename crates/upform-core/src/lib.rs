//! Upform Core Library
//!
//! Domain models, error types, configuration and form binding shared by every
//! Upform crate.

pub mod antiforgery;
pub mod binding;
pub mod config;
pub mod error;
pub mod models;
pub mod policy;

// Re-export commonly used types
pub use antiforgery::{AntiforgeryContext, AntiforgeryValidator};
pub use binding::{BindForm, FieldError, FormBinder, ValidationErrors};
pub use config::{Config, UploadLimits};
pub use error::{ErrorMetadata, IngestError, LogLevel};
pub use models::{BoundModel, FormValues, SessionState, StoredFileRef, UploadId, UploadSummary};
pub use policy::{FilePolicy, FileRoute, SinkKind};
