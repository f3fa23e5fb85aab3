//! Email conversation messages attached to bookings and contact submissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::validation::validate_not_blank;
use uuid::Uuid;
use validator::Validate;

/// Whether a message was received from or sent to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageDirection {
    Inbound,
    Outbound,
}

/// The conversation a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationOwner {
    Booking(Uuid),
    Contact(Uuid),
}

impl ConversationOwner {
    pub fn booking_id(&self) -> Option<Uuid> {
        match self {
            ConversationOwner::Booking(id) => Some(*id),
            ConversationOwner::Contact(_) => None,
        }
    }

    pub fn contact_id(&self) -> Option<Uuid> {
        match self {
            ConversationOwner::Contact(id) => Some(*id),
            ConversationOwner::Booking(_) => None,
        }
    }
}

/// One email in a conversation thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ConversationMessage {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<Uuid>,
    pub direction: MessageDirection,
    pub from_address: String,
    pub to_address: String,
    pub subject: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_message_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Data for storing a new message.
#[derive(Debug, Clone)]
pub struct NewConversationMessage {
    pub owner: ConversationOwner,
    pub direction: MessageDirection,
    pub from_address: String,
    pub to_address: String,
    pub subject: String,
    pub body: String,
    pub external_message_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Admin reply to a booking or contact thread.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReplyRequest {
    /// Defaults to `Re: <original subject>` with the reference tag.
    #[validate(length(max = 200, message = "Subject must be at most 200 characters"))]
    pub subject: Option<String>,

    #[validate(
        length(min = 1, max = 20000, message = "Reply must be 1-20000 characters"),
        custom(function = "validate_not_blank")
    )]
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_ids() {
        let id = Uuid::new_v4();
        let booking = ConversationOwner::Booking(id);
        assert_eq!(booking.booking_id(), Some(id));
        assert_eq!(booking.contact_id(), None);

        let contact = ConversationOwner::Contact(id);
        assert_eq!(contact.booking_id(), None);
        assert_eq!(contact.contact_id(), Some(id));
    }

    #[test]
    fn test_reply_request_rejects_blank_body() {
        let reply = ReplyRequest {
            subject: None,
            body: "   ".to_string(),
        };
        assert!(reply.validate().is_err());
    }

    #[test]
    fn test_direction_serialization() {
        assert_eq!(
            serde_json::to_string(&MessageDirection::Inbound).unwrap(),
            "\"INBOUND\""
        );
    }
}
