//! Admin management of the weekly template and blocked dates.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::availability::{
    AvailabilityWindowInput, BlockedDatesQuery, CreateBlockedDateRequest,
    ReplaceAvailabilityRequest, UpdateAvailabilityWindowRequest,
};
use domain::models::{AvailabilityWindow, BlockedDate};
use persistence::repositories::{AvailabilityRepository, BlockedDateRepository, WindowInput};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;

const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

fn to_input(w: &AvailabilityWindowInput) -> WindowInput {
    WindowInput {
        day_of_week: w.day_of_week,
        start_time: w.start_time,
        end_time: w.end_time,
        is_active: w.is_active,
    }
}

fn as_request_input(w: &AvailabilityWindow) -> AvailabilityWindowInput {
    AvailabilityWindowInput {
        day_of_week: w.day_of_week,
        start_time: w.start_time,
        end_time: w.end_time,
        is_active: w.is_active,
    }
}

/// Rejects templates where two active windows on the same day overlap.
fn reject_overlap(windows: Vec<AvailabilityWindowInput>) -> Result<(), ApiError> {
    let request = ReplaceAvailabilityRequest { windows };
    match request.find_overlap() {
        Some((a, b)) => Err(ApiError::Validation(format!(
            "Windows {}-{} and {}-{} on {} overlap",
            a.start_time.format("%H:%M"),
            a.end_time.format("%H:%M"),
            b.start_time.format("%H:%M"),
            b.end_time.format("%H:%M"),
            DAY_NAMES
                .get(a.day_of_week as usize)
                .copied()
                .unwrap_or("the same day"),
        ))),
        None => Ok(()),
    }
}

async fn stored_windows(
    repo: &AvailabilityRepository,
) -> Result<Vec<AvailabilityWindow>, ApiError> {
    Ok(repo
        .list_windows()
        .await?
        .into_iter()
        .map(AvailabilityWindow::from)
        .collect())
}

/// GET /api/v1/admin/availability
pub async fn list_windows(
    State(state): State<AppState>,
) -> Result<Json<Vec<AvailabilityWindow>>, ApiError> {
    let repo = AvailabilityRepository::new(state.pool.clone());
    Ok(Json(stored_windows(&repo).await?))
}

/// Replace the whole weekly template.
///
/// PUT /api/v1/admin/availability
pub async fn replace_windows(
    State(state): State<AppState>,
    Json(request): Json<ReplaceAvailabilityRequest>,
) -> Result<Json<Vec<AvailabilityWindow>>, ApiError> {
    request.validate()?;
    reject_overlap(request.windows.clone())?;

    let inputs: Vec<WindowInput> = request.windows.iter().map(to_input).collect();
    let windows = AvailabilityRepository::new(state.pool.clone())
        .replace_all(&inputs)
        .await?
        .into_iter()
        .map(AvailabilityWindow::from)
        .collect();

    Ok(Json(windows))
}

/// POST /api/v1/admin/availability
pub async fn create_window(
    State(state): State<AppState>,
    Json(request): Json<AvailabilityWindowInput>,
) -> Result<(StatusCode, Json<AvailabilityWindow>), ApiError> {
    request.validate()?;

    let repo = AvailabilityRepository::new(state.pool.clone());
    let mut all: Vec<AvailabilityWindowInput> = stored_windows(&repo)
        .await?
        .iter()
        .map(as_request_input)
        .collect();
    all.push(request.clone());
    reject_overlap(all)?;

    let window: AvailabilityWindow = repo.create(to_input(&request)).await?.into();
    info!(window_id = %window.id, day_of_week = window.day_of_week, "Availability window created");
    Ok((StatusCode::CREATED, Json(window)))
}

/// Partial update; unset fields keep their stored values.
///
/// PUT /api/v1/admin/availability/:id
pub async fn update_window(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateAvailabilityWindowRequest>,
) -> Result<Json<AvailabilityWindow>, ApiError> {
    request.validate()?;

    let repo = AvailabilityRepository::new(state.pool.clone());
    let stored = stored_windows(&repo).await?;
    let current = stored
        .iter()
        .find(|w| w.id == id)
        .ok_or_else(|| ApiError::NotFound("Availability window not found".to_string()))?;

    let merged = AvailabilityWindowInput {
        day_of_week: request.day_of_week.unwrap_or(current.day_of_week),
        start_time: request.start_time.unwrap_or(current.start_time),
        end_time: request.end_time.unwrap_or(current.end_time),
        is_active: request.is_active.unwrap_or(current.is_active),
    };
    if merged.start_time >= merged.end_time {
        return Err(ApiError::Validation(
            "Start time must be before end time".to_string(),
        ));
    }

    let mut all: Vec<AvailabilityWindowInput> = stored
        .iter()
        .filter(|w| w.id != id)
        .map(as_request_input)
        .collect();
    all.push(merged.clone());
    reject_overlap(all)?;

    let window = repo
        .update(id, to_input(&merged))
        .await?
        .ok_or_else(|| ApiError::NotFound("Availability window not found".to_string()))?;
    Ok(Json(window.into()))
}

/// DELETE /api/v1/admin/availability/:id
pub async fn delete_window(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !AvailabilityRepository::new(state.pool.clone()).delete(id).await? {
        return Err(ApiError::NotFound("Availability window not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/admin/blocked-dates?from=&to=
pub async fn list_blocked_dates(
    State(state): State<AppState>,
    Query(query): Query<BlockedDatesQuery>,
) -> Result<Json<Vec<BlockedDate>>, ApiError> {
    let dates = BlockedDateRepository::new(state.pool.clone())
        .list(query.from, query.to)
        .await?
        .into_iter()
        .map(BlockedDate::from)
        .collect();
    Ok(Json(dates))
}

/// POST /api/v1/admin/blocked-dates
pub async fn create_blocked_date(
    State(state): State<AppState>,
    Json(request): Json<CreateBlockedDateRequest>,
) -> Result<(StatusCode, Json<BlockedDate>), ApiError> {
    request.validate()?;

    let reason = request
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty());

    let blocked: BlockedDate = BlockedDateRepository::new(state.pool.clone())
        .create(request.date, reason)
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Conflict(_) => {
                ApiError::Conflict(format!("{} is already blocked", request.date))
            }
            other => other,
        })?
        .into();

    info!(date = %blocked.date, "Date blocked");
    Ok((StatusCode::CREATED, Json(blocked)))
}

/// DELETE /api/v1/admin/blocked-dates/:id
pub async fn delete_blocked_date(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !BlockedDateRepository::new(state.pool.clone()).delete(id).await? {
        return Err(ApiError::NotFound("Blocked date not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}
