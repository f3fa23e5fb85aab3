//! Public availability endpoints.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use domain::models::availability::{
    AvailabilityQuery, AvailabilityResponse, AvailableDaysQuery, AvailableDaysResponse,
};
use domain::models::session_type::find_session_type;
use domain::models::SessionType;

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::availability::{AvailabilityService, MAX_DAYS_RANGE};

fn session_for<'a>(state: &'a AppState, slug: &str) -> Result<&'a SessionType, ApiError> {
    find_session_type(&state.config.practice.session_types, slug)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown session type '{}'", slug)))
}

/// Open slots for one date.
///
/// GET /api/v1/availability?date=2024-06-03&session_type=performance-session
pub async fn get_availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let session = session_for(&state, &query.session_type)?;
    let practice = &state.config.practice;

    let slots = AvailabilityService::new(state.pool.clone(), practice)
        .slots_for_date(query.date, session, Utc::now())
        .await?;

    Ok(Json(AvailabilityResponse {
        date: query.date,
        session_type: session.slug.clone(),
        timezone: practice.timezone.clone(),
        slots,
    }))
}

/// Dates with at least one open slot, for the calendar view.
///
/// GET /api/v1/availability/days?from=2024-06-01&to=2024-06-30&session_type=...
pub async fn get_available_days(
    State(state): State<AppState>,
    Query(query): Query<AvailableDaysQuery>,
) -> Result<Json<AvailableDaysResponse>, ApiError> {
    if query.to < query.from {
        return Err(ApiError::Validation("'to' must not be before 'from'".into()));
    }
    if (query.to - query.from).num_days() > MAX_DAYS_RANGE {
        return Err(ApiError::Validation(format!(
            "Date range is limited to {} days",
            MAX_DAYS_RANGE
        )));
    }

    let session = session_for(&state, &query.session_type)?;
    let practice = &state.config.practice;

    let dates = AvailabilityService::new(state.pool.clone(), practice)
        .open_days(query.from, query.to, session, Utc::now())
        .await?;

    Ok(Json(AvailableDaysResponse {
        from: query.from,
        to: query.to,
        session_type: session.slug.clone(),
        timezone: practice.timezone.clone(),
        dates,
    }))
}
