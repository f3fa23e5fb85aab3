//! Captcha challenge issuance.

use axum::{extract::State, http::header, response::IntoResponse, Json};

use crate::app::AppState;

/// Issue a new arithmetic challenge.
///
/// GET /api/v1/captcha
pub async fn new_challenge(State(state): State<AppState>) -> impl IntoResponse {
    let challenge = state.captcha.issue();
    ([(header::CACHE_CONTROL, "no-store")], Json(challenge))
}
