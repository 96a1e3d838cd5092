//! Application state shared by all handlers

use std::sync::Arc;

use upform_core::Config;
use upform_infra::CsrfTokens;

use crate::services::{IngestionService, UploadResults};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub ingestion: Arc<IngestionService>,
    pub csrf: CsrfTokens,
    pub results: Arc<UploadResults>,
}
