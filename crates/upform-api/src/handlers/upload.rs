//! Upload submission and result handlers

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use upform_core::UploadId;
use upform_infra::context_from_headers;

use crate::error::{ErrorResponse, HttpAppError};
use crate::forms::DownloadForm;
use crate::services::results::summarize;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub upload_id: UploadId,
    /// Where the one-shot summary of this upload can be read
    pub location: String,
}

/// Stream a `multipart/form-data` upload into storage
pub async fn submit_upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let antiforgery = context_from_headers(&headers);
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());

    let model = state
        .ingestion
        .ingest::<DownloadForm, _, _>(&antiforgery, content_type, body.into_data_stream())
        .await?;

    let summary = summarize(
        &model,
        &state.config.primary_file_field,
        &state.config.image_file_field,
    );
    state.results.insert(summary).await;

    tracing::info!(
        upload_id = %model.upload_id,
        files = model.files.len(),
        title = %model.record.title,
        "Upload stored"
    );

    Ok(Json(UploadResponse {
        location: format!("/uploads/{}", model.upload_id),
        upload_id: model.upload_id,
    }))
}

/// Return the summary of a committed upload, once
pub async fn upload_result(
    State(state): State<AppState>,
    Path(upload_id): Path<String>,
) -> Response {
    let summary = match UploadId::parse(&upload_id) {
        Some(id) => state.results.take(&id).await,
        None => None,
    };

    match summary {
        Some(summary) => Json(summary).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("Upload result not found", "NOT_FOUND")),
        )
            .into_response(),
    }
}
