//! Route configuration and setup

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Setup all application routes
pub fn setup_routes(state: AppState) -> Router<()> {
    // Uploads are streamed to disk, so the body size is not capped here.
    let upload_routes = Router::new()
        .route("/uploads", post(handlers::upload::submit_upload))
        .layer(DefaultBodyLimit::disable());

    Router::new()
        .route("/uploads/new", get(handlers::csrf::new_upload_token))
        .route("/uploads/{upload_id}", get(handlers::upload::upload_result))
        .merge(upload_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
