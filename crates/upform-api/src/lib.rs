//! Upform API Library
//!
//! HTTP surface of the upload service: the ingestion orchestrator, handlers,
//! state and application setup.

pub mod error;
pub mod forms;
mod handlers;
pub mod services;
pub mod setup;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use forms::DownloadForm;
pub use services::{IngestionService, UploadResults};
