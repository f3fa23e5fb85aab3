//! Admin contact inbox.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::contact::{ContactDetailResponse, ListContactsQuery, UpdateContactStatusRequest};
use domain::models::message::{ConversationMessage, ConversationOwner, ReplyRequest};
use domain::models::{ContactStatus, ContactSubmission};
use persistence::repositories::{ContactRepository, MessageRepository};
use shared::pagination::{PageParams, Paginated};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::conversation::{send_reply, ReplyTarget};

fn not_found() -> ApiError {
    ApiError::NotFound("Contact submission not found".to_string())
}

/// GET /api/v1/admin/contacts
pub async fn list_contacts(
    State(state): State<AppState>,
    Query(query): Query<ListContactsQuery>,
) -> Result<Json<Paginated<ContactSubmission>>, ApiError> {
    let params = PageParams {
        page: query.page,
        per_page: query.per_page,
    };
    let status = query.status.map(Into::into);
    let search = query.search.as_deref();

    let repo = ContactRepository::new(state.pool.clone());
    let contacts = repo
        .list(status, search, params.limit(), params.offset())
        .await?
        .into_iter()
        .map(ContactSubmission::from)
        .collect();
    let total = repo.count(status, search).await?;

    Ok(Json(Paginated::new(contacts, &params, total)))
}

/// Submission with its thread. Opening a NEW submission marks it READ and
/// clears the unread-reply flag.
///
/// GET /api/v1/admin/contacts/:id
pub async fn get_contact(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ContactDetailResponse>, ApiError> {
    let contact: ContactSubmission = ContactRepository::new(state.pool.clone())
        .mark_viewed(id)
        .await?
        .ok_or_else(not_found)?
        .into();

    let messages = MessageRepository::new(state.pool.clone())
        .list_for_contact(id)
        .await?
        .into_iter()
        .map(ConversationMessage::from)
        .collect();

    Ok(Json(ContactDetailResponse { contact, messages }))
}

/// PATCH /api/v1/admin/contacts/:id/status
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateContactStatusRequest>,
) -> Result<Json<ContactSubmission>, ApiError> {
    let contact = ContactRepository::new(state.pool.clone())
        .update_status(id, request.status.into())
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(contact.into()))
}

/// Email the sender and mark the submission REPLIED.
///
/// POST /api/v1/admin/contacts/:id/reply
pub async fn reply(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReplyRequest>,
) -> Result<(StatusCode, Json<ConversationMessage>), ApiError> {
    let repo = ContactRepository::new(state.pool.clone());
    let contact: ContactSubmission = repo.find_by_id(id).await?.ok_or_else(not_found)?.into();

    let message = send_reply(
        &state,
        ReplyTarget {
            owner: ConversationOwner::Contact(contact.id),
            reference: &contact.reference,
            default_subject: format!("Re: {}", contact.subject),
            recipient_email: &contact.email,
            recipient_name: &contact.name,
        },
        &request,
    )
    .await?;

    repo.update_status(id, ContactStatus::Replied.into()).await?;

    Ok((StatusCode::CREATED, Json(message)))
}

/// DELETE /api/v1/admin/contacts/:id
pub async fn delete_contact(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !ContactRepository::new(state.pool.clone()).delete(id).await? {
        return Err(not_found());
    }
    tracing::info!(contact_id = %id, "Contact submission deleted");
    Ok(StatusCode::NO_CONTENT)
}
