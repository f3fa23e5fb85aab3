//! Public booking endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use domain::models::booking::{
    BookingCreatedResponse, CancelBookingRequest, CreateBookingRequest,
};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ClientIp;
use crate::services::BookingWorkflow;

/// Request a session. The booking stays PENDING until the practitioner
/// confirms it.
///
/// POST /api/v1/bookings
pub async fn create_booking(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingCreatedResponse>), ApiError> {
    let booking = BookingWorkflow::new(&state)
        .create(request, Utc::now())
        .await?;
    tracing::debug!(reference = %booking.reference, client_ip = ?client_ip, "Booking request accepted");
    Ok((StatusCode::CREATED, Json(BookingCreatedResponse::from(&booking))))
}

/// Cancel a booking with the token from the confirmation email.
///
/// POST /api/v1/bookings/:reference/cancel
pub async fn cancel_booking(
    State(state): State<AppState>,
    Path(reference): Path<String>,
    Json(request): Json<CancelBookingRequest>,
) -> Result<Json<BookingCreatedResponse>, ApiError> {
    request.validate()?;

    let booking = BookingWorkflow::new(&state)
        .cancel_by_client(&reference, &request.token, Utc::now())
        .await?;
    Ok(Json(BookingCreatedResponse::from(&booking)))
}
