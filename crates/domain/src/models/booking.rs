//! Booking domain model and status workflow.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::validation::{validate_no_html, validate_not_blank, validate_phone};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::models::message::ConversationMessage;

/// Prefix of booking references (`BK-7F3A9C`).
pub const BOOKING_REFERENCE_PREFIX: &str = "BK";

/// Lifecycle status of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Declined,
    Cancelled,
    Completed,
}

/// Rejected status change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot change booking status from {from} to {to}")]
pub struct BookingTransitionError {
    pub from: BookingStatus,
    pub to: BookingStatus,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Declined => "DECLINED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Completed => "COMPLETED",
        }
    }

    /// Whether a booking in this status occupies its time slot.
    pub fn blocks_slot(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Declined | BookingStatus::Cancelled | BookingStatus::Completed
        )
    }

    /// PENDING -> CONFIRMED | DECLINED | CANCELLED, CONFIRMED -> CANCELLED | COMPLETED.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (
                BookingStatus::Pending,
                BookingStatus::Confirmed | BookingStatus::Declined | BookingStatus::Cancelled
            ) | (
                BookingStatus::Confirmed,
                BookingStatus::Cancelled | BookingStatus::Completed
            )
        )
    }

    pub fn transition(self, next: BookingStatus) -> Result<BookingStatus, BookingTransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(BookingTransitionError {
                from: self,
                to: next,
            })
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(BookingStatus::Pending),
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "DECLINED" => Ok(BookingStatus::Declined),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            "COMPLETED" => Ok(BookingStatus::Completed),
            other => Err(format!("Unknown booking status: {}", other)),
        }
    }
}

/// A session booking.
#[derive(Debug, Clone, Serialize)]
pub struct Booking {
    pub id: Uuid,
    pub reference: String,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: Option<String>,
    pub session_type: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: BookingStatus,
    pub message: Option<String>,
    pub admin_notes: Option<String>,
    pub decline_reason: Option<String>,
    pub calendar_event_id: Option<String>,
    #[serde(skip_serializing)]
    pub manage_token_hash: String,
    pub has_unread_reply: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Subject tag that routes email replies back to this booking.
    pub fn subject_tag(&self) -> String {
        format!("[{}]", self.reference)
    }
}

/// Public booking request from the website.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBookingRequest {
    #[validate(
        length(min = 1, max = 120, message = "Name must be 1-120 characters"),
        custom(function = "validate_not_blank"),
        custom(function = "validate_no_html")
    )]
    pub client_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub client_email: String,

    #[validate(custom(function = "validate_phone"))]
    pub client_phone: Option<String>,

    #[validate(length(min = 1, max = 64, message = "Session type is required"))]
    pub session_type: String,

    pub starts_at: DateTime<Utc>,

    #[validate(length(max = 2000, message = "Message must be at most 2000 characters"))]
    pub message: Option<String>,

    #[validate(length(min = 1, message = "Captcha token is required"))]
    pub captcha_token: String,

    #[validate(length(min = 1, max = 8, message = "Captcha answer is required"))]
    pub captcha_answer: String,
}

/// Response after a booking request was accepted.
#[derive(Debug, Clone, Serialize)]
pub struct BookingCreatedResponse {
    pub reference: String,
    pub status: BookingStatus,
    pub session_type: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl From<&Booking> for BookingCreatedResponse {
    fn from(b: &Booking) -> Self {
        Self {
            reference: b.reference.clone(),
            status: b.status,
            session_type: b.session_type.clone(),
            starts_at: b.starts_at,
            ends_at: b.ends_at,
        }
    }
}

/// Client cancellation using the token from the confirmation email.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CancelBookingRequest {
    #[validate(length(min = 16, max = 128, message = "Invalid cancellation token"))]
    pub token: String,
}

/// Admin status change.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateBookingStatusRequest {
    pub status: BookingStatus,

    /// Shown to the client when declining or cancelling.
    #[validate(length(max = 1000, message = "Reason must be at most 1000 characters"))]
    pub reason: Option<String>,

    /// Send the status email to the client (default true).
    #[serde(default = "default_notify")]
    pub notify_client: bool,
}

fn default_notify() -> bool {
    true
}

/// Admin private notes.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateBookingNotesRequest {
    #[validate(length(max = 5000, message = "Notes must be at most 5000 characters"))]
    pub admin_notes: Option<String>,
}

/// Filters for the admin booking list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListBookingsQuery {
    pub status: Option<BookingStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Booking with its email thread.
#[derive(Debug, Clone, Serialize)]
pub struct BookingDetailResponse {
    pub booking: Booking,
    pub messages: Vec<ConversationMessage>,
}
