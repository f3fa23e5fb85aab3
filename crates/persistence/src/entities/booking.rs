//! Booking entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::booking::{Booking, BookingStatus};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for booking status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
pub enum BookingStatusDb {
    Pending,
    Confirmed,
    Declined,
    Cancelled,
    Completed,
}

impl From<BookingStatusDb> for BookingStatus {
    fn from(db: BookingStatusDb) -> Self {
        match db {
            BookingStatusDb::Pending => BookingStatus::Pending,
            BookingStatusDb::Confirmed => BookingStatus::Confirmed,
            BookingStatusDb::Declined => BookingStatus::Declined,
            BookingStatusDb::Cancelled => BookingStatus::Cancelled,
            BookingStatusDb::Completed => BookingStatus::Completed,
        }
    }
}

impl From<BookingStatus> for BookingStatusDb {
    fn from(status: BookingStatus) -> Self {
        match status {
            BookingStatus::Pending => BookingStatusDb::Pending,
            BookingStatus::Confirmed => BookingStatusDb::Confirmed,
            BookingStatus::Declined => BookingStatusDb::Declined,
            BookingStatus::Cancelled => BookingStatusDb::Cancelled,
            BookingStatus::Completed => BookingStatusDb::Completed,
        }
    }
}

/// Database row mapping for the bookings table.
#[derive(Debug, Clone, FromRow)]
pub struct BookingEntity {
    pub id: Uuid,
    pub reference: String,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: Option<String>,
    pub session_type: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: BookingStatusDb,
    pub message: Option<String>,
    pub admin_notes: Option<String>,
    pub decline_reason: Option<String>,
    pub calendar_event_id: Option<String>,
    pub manage_token_hash: String,
    pub has_unread_reply: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BookingEntity> for Booking {
    fn from(entity: BookingEntity) -> Self {
        Self {
            id: entity.id,
            reference: entity.reference,
            client_name: entity.client_name,
            client_email: entity.client_email,
            client_phone: entity.client_phone,
            session_type: entity.session_type,
            starts_at: entity.starts_at,
            ends_at: entity.ends_at,
            status: entity.status.into(),
            message: entity.message,
            admin_notes: entity.admin_notes,
            decline_reason: entity.decline_reason,
            calendar_event_id: entity.calendar_event_id,
            manage_token_hash: entity.manage_token_hash,
            has_unread_reply: entity.has_unread_reply,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Declined,
            BookingStatus::Cancelled,
            BookingStatus::Completed,
        ] {
            let db: BookingStatusDb = status.into();
            assert_eq!(BookingStatus::from(db), status);
        }
    }
}
