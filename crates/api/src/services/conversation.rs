//! Outbound replies inside a booking or contact email thread.

use chrono::Utc;
use domain::models::message::{
    ConversationMessage, ConversationOwner, MessageDirection, NewConversationMessage, ReplyRequest,
};
use persistence::repositories::MessageRepository;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::email_templates::TemplateContext;

/// Who receives a reply and which thread it belongs to.
#[derive(Debug, Clone)]
pub struct ReplyTarget<'a> {
    pub owner: ConversationOwner,
    pub reference: &'a str,
    /// Used when the admin leaves the subject empty.
    pub default_subject: String,
    pub recipient_email: &'a str,
    pub recipient_name: &'a str,
}

/// Emails the reply and stores it as an OUTBOUND message.
///
/// A failed send is reported as 503 and nothing is stored.
pub async fn send_reply(
    state: &AppState,
    target: ReplyTarget<'_>,
    request: &ReplyRequest,
) -> Result<ConversationMessage, ApiError> {
    request.validate()?;

    let subject = request
        .subject
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or(target.default_subject);

    let rendered = TemplateContext::from_config(&state.config).reply(
        target.reference,
        &subject,
        target.recipient_name,
        &request.body,
    );
    let stored_subject = rendered.subject.clone();
    let stored_body = rendered.body_text.clone();

    state
        .email
        .send(rendered.into_message(target.recipient_email, Some(target.recipient_name)))
        .await
        .map_err(|e| {
            tracing::error!(reference = %target.reference, error = %e, "Reply could not be sent");
            ApiError::ServiceUnavailable("Email could not be sent, please try again".into())
        })?;

    let message = NewConversationMessage {
        owner: target.owner,
        direction: MessageDirection::Outbound,
        from_address: state.email.sender_email().to_string(),
        to_address: target.recipient_email.to_string(),
        subject: stored_subject,
        body: stored_body,
        external_message_id: None,
        created_at: Utc::now(),
    };

    let stored = MessageRepository::new(state.pool.clone())
        .create(&message)
        .await?
        .ok_or_else(|| ApiError::Internal("Outbound message was not stored".into()))?;

    tracing::info!(reference = %target.reference, message_id = %stored.id, "Reply sent");
    Ok(stored.into())
}
