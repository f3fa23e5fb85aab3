//! Conversation message repository.

use domain::models::message::NewConversationMessage;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{ConversationMessageEntity, MessageDirectionDb};
use crate::metrics::QueryTimer;

/// Repository for booking and contact email threads.
#[derive(Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Stores a message. Returns `None` if a message with the same external
    /// id was already stored.
    pub async fn create(
        &self,
        message: &NewConversationMessage,
    ) -> Result<Option<ConversationMessageEntity>, sqlx::Error> {
        let timer = QueryTimer::new("create_conversation_message");
        let result = sqlx::query_as::<_, ConversationMessageEntity>(
            r#"
            INSERT INTO conversation_messages (
                booking_id, contact_id, direction, from_address, to_address,
                subject, body, external_message_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (external_message_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(message.owner.booking_id())
        .bind(message.owner.contact_id())
        .bind(MessageDirectionDb::from(message.direction))
        .bind(&message.from_address)
        .bind(&message.to_address)
        .bind(&message.subject)
        .bind(&message.body)
        .bind(message.external_message_id.as_deref())
        .bind(message.created_at)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn list_for_booking(
        &self,
        booking_id: Uuid,
    ) -> Result<Vec<ConversationMessageEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_booking_messages");
        let result = sqlx::query_as::<_, ConversationMessageEntity>(
            "SELECT * FROM conversation_messages WHERE booking_id = $1 ORDER BY created_at",
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn list_for_contact(
        &self,
        contact_id: Uuid,
    ) -> Result<Vec<ConversationMessageEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_contact_messages");
        let result = sqlx::query_as::<_, ConversationMessageEntity>(
            "SELECT * FROM conversation_messages WHERE contact_id = $1 ORDER BY created_at",
        )
        .bind(contact_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn exists_external_id(&self, external_message_id: &str) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("message_external_id_exists");
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM conversation_messages WHERE external_message_id = $1)",
        )
        .bind(external_message_id)
        .fetch_one(&self.pool)
        .await?;
        timer.record();
        Ok(exists.0)
    }
}
