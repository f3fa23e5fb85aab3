//! Conversation message entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::message::{ConversationMessage, MessageDirection};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for message direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "message_direction", rename_all = "lowercase")]
pub enum MessageDirectionDb {
    Inbound,
    Outbound,
}

impl From<MessageDirectionDb> for MessageDirection {
    fn from(db: MessageDirectionDb) -> Self {
        match db {
            MessageDirectionDb::Inbound => MessageDirection::Inbound,
            MessageDirectionDb::Outbound => MessageDirection::Outbound,
        }
    }
}

impl From<MessageDirection> for MessageDirectionDb {
    fn from(direction: MessageDirection) -> Self {
        match direction {
            MessageDirection::Inbound => MessageDirectionDb::Inbound,
            MessageDirection::Outbound => MessageDirectionDb::Outbound,
        }
    }
}

/// Database row mapping for the conversation_messages table.
#[derive(Debug, Clone, FromRow)]
pub struct ConversationMessageEntity {
    pub id: Uuid,
    pub booking_id: Option<Uuid>,
    pub contact_id: Option<Uuid>,
    pub direction: MessageDirectionDb,
    pub from_address: String,
    pub to_address: String,
    pub subject: String,
    pub body: String,
    pub external_message_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ConversationMessageEntity> for ConversationMessage {
    fn from(entity: ConversationMessageEntity) -> Self {
        Self {
            id: entity.id,
            booking_id: entity.booking_id,
            contact_id: entity.contact_id,
            direction: entity.direction.into(),
            from_address: entity.from_address,
            to_address: entity.to_address,
            subject: entity.subject,
            body: entity.body,
            external_message_id: entity.external_message_id,
            created_at: entity.created_at,
        }
    }
}
