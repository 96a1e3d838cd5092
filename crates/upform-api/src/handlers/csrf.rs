//! Anti-forgery token issuance

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CsrfTokenResponse {
    pub token: String,
}

/// Issue a fresh token, returned in the body and set as the `csrf-token` cookie.
///
/// Clients send it back in the `X-CSRF-Token` header when posting an upload.
pub async fn new_upload_token(State(state): State<AppState>) -> impl IntoResponse {
    let token = state.csrf.generate();
    let cookie = state.csrf.cookie(&token, state.config.is_production());

    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(CsrfTokenResponse { token }),
    )
}
