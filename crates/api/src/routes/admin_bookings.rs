//! Admin booking management.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Duration, NaiveTime};
use domain::models::booking::{
    BookingDetailResponse, ListBookingsQuery, UpdateBookingNotesRequest,
    UpdateBookingStatusRequest,
};
use domain::models::message::{ConversationMessage, ConversationOwner, ReplyRequest};
use domain::models::session_type::find_session_type;
use domain::models::Booking;
use domain::services::availability::local_to_utc;
use persistence::repositories::{BookingFilter, BookingRepository, MessageRepository};
use shared::pagination::{PageParams, Paginated};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AdminAuth;
use crate::services::conversation::{send_reply, ReplyTarget};
use crate::services::BookingWorkflow;

fn not_found() -> ApiError {
    ApiError::NotFound("Booking not found".to_string())
}

async fn load_booking(repo: &BookingRepository, id: Uuid) -> Result<Booking, ApiError> {
    Ok(repo.find_by_id(id).await?.ok_or_else(not_found)?.into())
}

/// List bookings with optional status, date range and search filters.
///
/// GET /api/v1/admin/bookings
pub async fn list_bookings(
    State(state): State<AppState>,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<Paginated<Booking>>, ApiError> {
    let params = PageParams {
        page: query.page,
        per_page: query.per_page,
    };

    // date filters are practice-local days
    let tz = state.config.practice.tz();
    let filter = BookingFilter {
        status: query.status.map(Into::into),
        starts_from: query
            .from
            .and_then(|d| local_to_utc(&tz, d.and_time(NaiveTime::MIN))),
        starts_before: query
            .to
            .and_then(|d| local_to_utc(&tz, (d + Duration::days(1)).and_time(NaiveTime::MIN))),
        search: query.search,
    };

    let repo = BookingRepository::new(state.pool.clone());
    let bookings = repo
        .list(&filter, params.limit(), params.offset())
        .await?
        .into_iter()
        .map(Booking::from)
        .collect();
    let total = repo.count(&filter).await?;

    Ok(Json(Paginated::new(bookings, &params, total)))
}

/// Booking with its email thread. Clears the unread-reply flag.
///
/// GET /api/v1/admin/bookings/:id
pub async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingDetailResponse>, ApiError> {
    let repo = BookingRepository::new(state.pool.clone());
    let mut booking = load_booking(&repo, id).await?;

    let messages: Vec<ConversationMessage> = MessageRepository::new(state.pool.clone())
        .list_for_booking(id)
        .await?
        .into_iter()
        .map(ConversationMessage::from)
        .collect();

    if booking.has_unread_reply {
        repo.set_unread_reply(id, false).await?;
        booking.has_unread_reply = false;
    }

    Ok(Json(BookingDetailResponse { booking, messages }))
}

/// Change a booking's status and run its emails and calendar updates.
///
/// PATCH /api/v1/admin/bookings/:id/status
pub async fn update_status(
    State(state): State<AppState>,
    auth: AdminAuth,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateBookingStatusRequest>,
) -> Result<Json<Booking>, ApiError> {
    let status = request.status;
    let booking = BookingWorkflow::new(&state)
        .change_status(id, request)
        .await?;
    info!(booking_id = %id, status = %status, admin = %auth.email, "Admin updated booking status");
    Ok(Json(booking))
}

/// Replace the private admin notes.
///
/// PUT /api/v1/admin/bookings/:id/notes
pub async fn update_notes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateBookingNotesRequest>,
) -> Result<Json<Booking>, ApiError> {
    request.validate()?;

    let notes = request
        .admin_notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    let booking = BookingRepository::new(state.pool.clone())
        .update_admin_notes(id, notes)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(booking.into()))
}

/// Email the client inside the booking thread.
///
/// POST /api/v1/admin/bookings/:id/reply
pub async fn reply(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReplyRequest>,
) -> Result<(StatusCode, Json<ConversationMessage>), ApiError> {
    let booking = load_booking(&BookingRepository::new(state.pool.clone()), id).await?;

    let session_name = find_session_type(&state.config.practice.session_types, &booking.session_type)
        .map(|s| s.name.clone())
        .unwrap_or_else(|| booking.session_type.clone());

    let message = send_reply(
        &state,
        ReplyTarget {
            owner: ConversationOwner::Booking(booking.id),
            reference: &booking.reference,
            default_subject: format!("Your booking: {}", session_name),
            recipient_email: &booking.client_email,
            recipient_name: &booking.client_name,
        },
        &request,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

/// Delete a booking and its thread.
///
/// DELETE /api/v1/admin/bookings/:id
pub async fn delete_booking(
    State(state): State<AppState>,
    auth: AdminAuth,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !BookingRepository::new(state.pool.clone()).delete(id).await? {
        return Err(not_found());
    }
    info!(booking_id = %id, admin = %auth.email, "Booking deleted");
    Ok(StatusCode::NO_CONTENT)
}
