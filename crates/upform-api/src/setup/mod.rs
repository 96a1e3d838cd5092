//! Application setup and initialization

pub mod routes;
pub mod server;

use std::sync::Arc;

use anyhow::{Context, Result};
use upform_core::Config;
use upform_infra::CsrfTokens;
use upform_storage::{ScratchStorage, StorageLayout};

use crate::services::{IngestionService, UploadResults};
use crate::state::AppState;

/// Build state and router from a loaded configuration.
///
/// Validates the configuration and creates the scratch and final roots. Telemetry
/// is initialized by the caller.
pub async fn initialize_app(config: Config) -> Result<(AppState, axum::Router)> {
    config
        .validate()
        .context("Configuration validation failed")?;

    if config.uses_dev_secret() {
        tracing::warn!("CSRF_SECRET not configured, using insecure default. This should be set in production.");
    }

    let layout = StorageLayout::new(&config.scratch_root, &config.final_root);
    let storage = ScratchStorage::new(layout)
        .await
        .context("Failed to prepare upload storage")?;

    let csrf = CsrfTokens::new(&config.csrf_secret, config.csrf_token_ttl_secs);
    let ingestion = IngestionService::new(
        storage,
        config.file_policy(),
        config.limits.clone(),
        Arc::new(csrf.clone()),
    );

    tracing::info!(
        scratch_root = %config.scratch_root.display(),
        final_root = %config.final_root.display(),
        primary_field = %config.primary_file_field,
        image_field = %config.image_file_field,
        "Upload storage ready"
    );

    let state = AppState {
        config: Arc::new(config),
        ingestion: Arc::new(ingestion),
        csrf,
        results: Arc::new(UploadResults::new()),
    };
    let router = routes::setup_routes(state.clone());

    Ok((state, router))
}
