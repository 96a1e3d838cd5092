//! Domain models for upload ingestion

pub mod form;
pub mod summary;
pub mod upload;

pub use form::FormValues;
pub use summary::{format_kilobytes, format_megabytes, UploadSummary};
pub use upload::{BoundModel, SessionState, StoredFileRef, UploadId};
