//! Contact submission entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::contact::{ContactStatus, ContactSubmission};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for contact status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "contact_status", rename_all = "lowercase")]
pub enum ContactStatusDb {
    New,
    Read,
    Replied,
    Archived,
}

impl From<ContactStatusDb> for ContactStatus {
    fn from(db: ContactStatusDb) -> Self {
        match db {
            ContactStatusDb::New => ContactStatus::New,
            ContactStatusDb::Read => ContactStatus::Read,
            ContactStatusDb::Replied => ContactStatus::Replied,
            ContactStatusDb::Archived => ContactStatus::Archived,
        }
    }
}

impl From<ContactStatus> for ContactStatusDb {
    fn from(status: ContactStatus) -> Self {
        match status {
            ContactStatus::New => ContactStatusDb::New,
            ContactStatus::Read => ContactStatusDb::Read,
            ContactStatus::Replied => ContactStatusDb::Replied,
            ContactStatus::Archived => ContactStatusDb::Archived,
        }
    }
}

/// Database row mapping for the contact_submissions table.
#[derive(Debug, Clone, FromRow)]
pub struct ContactSubmissionEntity {
    pub id: Uuid,
    pub reference: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    pub status: ContactStatusDb,
    pub has_unread_reply: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ContactSubmissionEntity> for ContactSubmission {
    fn from(entity: ContactSubmissionEntity) -> Self {
        Self {
            id: entity.id,
            reference: entity.reference,
            name: entity.name,
            email: entity.email,
            phone: entity.phone,
            subject: entity.subject,
            message: entity.message,
            status: entity.status.into(),
            has_unread_reply: entity.has_unread_reply,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
