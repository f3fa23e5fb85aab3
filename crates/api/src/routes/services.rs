//! Session-type catalog.

use axum::{extract::State, Json};
use domain::models::SessionType;
use serde::Serialize;

use crate::app::AppState;

#[derive(Debug, Serialize)]
pub struct ServicesResponse {
    pub timezone: String,
    pub services: Vec<SessionType>,
}

/// List the bookable session types.
///
/// GET /api/v1/services
pub async fn list_services(State(state): State<AppState>) -> Json<ServicesResponse> {
    let practice = &state.config.practice;
    Json(ServicesResponse {
        timezone: practice.timezone.clone(),
        services: practice.session_types.clone(),
    })
}
