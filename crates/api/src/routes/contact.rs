//! Public contact form.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::contact::{ContactCreatedResponse, ContactRequest, CONTACT_REFERENCE_PREFIX};
use domain::models::ContactSubmission;
use persistence::repositories::{ContactRepository, NewContactSubmission};
use shared::crypto::generate_reference;
use shared::validation::normalize_email;
use tracing::{info, warn};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ClientIp;
use crate::middleware::metrics::record_contact_submission;
use crate::services::email_templates::TemplateContext;

/// Store a contact message and send the acknowledgement and notification.
///
/// POST /api/v1/contact
pub async fn submit_contact(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    Json(request): Json<ContactRequest>,
) -> Result<(StatusCode, Json<ContactCreatedResponse>), ApiError> {
    request.validate()?;
    state
        .captcha
        .verify(&request.captcha_token, &request.captcha_answer)?;

    let reference = generate_reference(CONTACT_REFERENCE_PREFIX);
    let email = normalize_email(&request.email);
    let phone = request
        .phone
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty());

    let contact: ContactSubmission = ContactRepository::new(state.pool.clone())
        .create(&NewContactSubmission {
            reference: &reference,
            name: request.name.trim(),
            email: &email,
            phone,
            subject: request.subject.trim(),
            message: request.message.trim(),
        })
        .await?
        .into();

    record_contact_submission();
    info!(
        contact_id = %contact.id,
        reference = %contact.reference,
        client_ip = ?client_ip,
        "Contact message received"
    );

    let templates = TemplateContext::from_config(&state.config);
    let practice = &state.config.practice;

    let ack = templates
        .contact_received(&contact)
        .into_message(&contact.email, Some(&contact.name));
    let mut notification = templates
        .contact_notification(&contact)
        .into_message(&practice.practitioner_email, Some(&practice.practitioner_name));
    notification.reply_to = Some(contact.email.clone());

    for (kind, message) in [("acknowledgement", ack), ("notification", notification)] {
        if let Err(e) = state.email.send(message).await {
            warn!(reference = %contact.reference, email = kind, error = %e, "Contact email failed");
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(ContactCreatedResponse {
            reference: contact.reference,
        }),
    ))
}
