pub mod results;
pub mod upload;

pub use results::UploadResults;
pub use upload::IngestionService;
