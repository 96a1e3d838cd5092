//! Test helpers: build services, state and router for integration tests.
//!
//! Run from workspace root: `cargo test -p upform-api`.

#![allow(dead_code)]

pub mod multipart;
pub mod storage;

use std::sync::Arc;

use axum_test::TestServer;
use upform_api::setup::initialize_app;
use upform_api::state::AppState;
use upform_api::IngestionService;
use upform_core::{AntiforgeryContext, Config, FilePolicy, UploadLimits};
use upform_storage::{ScratchStorage, StorageLayout};

use storage::TestStorage;

pub const TEST_CSRF_SECRET: &str = "test-csrf-secret-that-is-long-enough-for-prod";

/// Orchestrator over `storage` whose anti-forgery check always answers `accept`
pub async fn ingestion_service(storage: &TestStorage, accept: bool) -> IngestionService {
    ingestion_service_with_limits(storage, accept, UploadLimits::default()).await
}

pub async fn ingestion_service_with_limits(
    storage: &TestStorage,
    accept: bool,
    limits: UploadLimits,
) -> IngestionService {
    let layout = StorageLayout::new(&storage.scratch_root, &storage.final_root);
    let scratch = ScratchStorage::new(layout)
        .await
        .expect("Failed to create scratch storage");

    IngestionService::new(
        scratch,
        FilePolicy::default(),
        limits,
        Arc::new(move |_: &AntiforgeryContext| accept),
    )
}

pub fn create_test_config(storage: &TestStorage) -> Config {
    Config {
        server_port: 0,
        environment: "test".to_string(),
        scratch_root: storage.scratch_root.clone(),
        final_root: storage.final_root.clone(),
        csrf_secret: TEST_CSRF_SECRET.to_string(),
        csrf_token_ttl_secs: 3600,
        primary_file_field: "File".to_string(),
        image_file_field: "FileImage".to_string(),
        limits: UploadLimits::default(),
        log_format: "compact".to_string(),
    }
}

/// Test application: server, state and the temp directories behind it.
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub storage: TestStorage,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

pub async fn setup_test_app() -> TestApp {
    let storage = TestStorage::new();
    let config = create_test_config(&storage);

    let (state, router) = initialize_app(config)
        .await
        .expect("Failed to initialize app");
    let server =
        TestServer::new(router.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        state,
        storage,
    }
}
