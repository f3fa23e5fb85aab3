//! Contact form submissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::validation::{validate_no_html, validate_not_blank, validate_phone};
use uuid::Uuid;
use validator::Validate;

use crate::models::message::ConversationMessage;

/// Prefix of contact references (`CT-4K8M2P`).
pub const CONTACT_REFERENCE_PREFIX: &str = "CT";

/// Inbox status of a contact submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContactStatus {
    New,
    Read,
    Replied,
    Archived,
}

impl ContactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::New => "NEW",
            ContactStatus::Read => "READ",
            ContactStatus::Replied => "REPLIED",
            ContactStatus::Archived => "ARCHIVED",
        }
    }
}

impl std::fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message sent through the website contact form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ContactSubmission {
    pub id: Uuid,
    pub reference: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    pub status: ContactStatus,
    pub has_unread_reply: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContactSubmission {
    pub fn subject_tag(&self) -> String {
        format!("[{}]", self.reference)
    }
}

/// Public contact form payload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ContactRequest {
    #[validate(
        length(min = 1, max = 120, message = "Name must be 1-120 characters"),
        custom(function = "validate_not_blank"),
        custom(function = "validate_no_html")
    )]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,

    #[validate(
        length(min = 1, max = 200, message = "Subject must be 1-200 characters"),
        custom(function = "validate_not_blank"),
        custom(function = "validate_no_html")
    )]
    pub subject: String,

    #[validate(
        length(min = 10, max = 5000, message = "Message must be 10-5000 characters"),
        custom(function = "validate_not_blank")
    )]
    pub message: String,

    #[validate(length(min = 1, message = "Captcha token is required"))]
    pub captcha_token: String,

    #[validate(length(min = 1, max = 8, message = "Captcha answer is required"))]
    pub captcha_answer: String,
}

/// Response after a contact submission was stored.
#[derive(Debug, Clone, Serialize)]
pub struct ContactCreatedResponse {
    pub reference: String,
}

/// Admin status change.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateContactStatusRequest {
    pub status: ContactStatus,
}

/// Filters for the admin contact list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListContactsQuery {
    pub status: Option<ContactStatus>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Contact submission with its email thread.
#[derive(Debug, Clone, Serialize)]
pub struct ContactDetailResponse {
    pub contact: ContactSubmission,
    pub messages: Vec<ConversationMessage>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::internet::en::SafeEmail;
    use fake::faker::lorem::en::Paragraph;
    use fake::Fake;

    fn request() -> ContactRequest {
        ContactRequest {
            name: "Robin Keller".to_string(),
            email: SafeEmail().fake(),
            phone: None,
            subject: "Team workshop enquiry".to_string(),
            message: Paragraph(1..3).fake(),
            captcha_token: "token".to_string(),
            captcha_answer: "4".to_string(),
        }
    }

    #[test]
    fn test_valid_contact_request() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_short_message_rejected() {
        let mut r = request();
        r.message = "hi".to_string();
        assert!(r.validate().is_err());
    }

    #[test]
    fn test_html_in_subject_rejected() {
        let mut r = request();
        r.subject = "<a href=x>win</a>".to_string();
        let errors = r.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("subject"));
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&ContactStatus::Replied).unwrap(), "\"REPLIED\"");
        let parsed: UpdateContactStatusRequest =
            serde_json::from_str(r#"{"status": "ARCHIVED"}"#).unwrap();
        assert_eq!(parsed.status, ContactStatus::Archived);
    }
}
