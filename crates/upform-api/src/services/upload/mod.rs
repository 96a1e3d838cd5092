//! Streaming upload ingestion

mod service;
mod session;

pub use service::IngestionService;
pub use session::{IngestStage, UploadSession};
