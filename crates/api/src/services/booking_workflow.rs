//! Booking lifecycle: public requests, admin status changes and client
//! cancellation, with their emails and calendar updates.
//!
//! Email and calendar failures are logged and never undo a status change.

use chrono::{DateTime, Utc};
use domain::models::booking::{
    CreateBookingRequest, UpdateBookingStatusRequest, BOOKING_REFERENCE_PREFIX,
};
use domain::models::session_type::find_session_type;
use domain::models::{Booking, BookingStatus};
use domain::services::availability::{find_slot, local_date};
use persistence::repositories::{
    violates_constraint, BookingRepository, NewBooking, BOOKING_OVERLAP_CONSTRAINT,
    BOOKING_REFERENCE_CONSTRAINT,
};
use shared::crypto::{constant_time_eq, generate_reference, generate_secure_token, sha256_hex};
use shared::validation::normalize_email;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::{record_booking_created, record_booking_status_changed};
use crate::services::availability::AvailabilityService;
use crate::services::calendar::CalendarService;
use crate::services::email::EmailMessage;
use crate::services::email_templates::TemplateContext;

const SLOT_TAKEN: &str = "The selected time is no longer available";

/// Random bytes in the emailed manage token (base64url encoded).
const MANAGE_TOKEN_BYTES: usize = 24;

/// Fresh references to try when a generated one is already taken.
const REFERENCE_ATTEMPTS: u32 = 3;

pub struct BookingWorkflow<'s> {
    state: &'s AppState,
    bookings: BookingRepository,
    templates: TemplateContext,
}

impl<'s> BookingWorkflow<'s> {
    pub fn new(state: &'s AppState) -> Self {
        Self {
            state,
            bookings: BookingRepository::new(state.pool.clone()),
            templates: TemplateContext::from_config(&state.config),
        }
    }

    fn calendar(&self) -> CalendarService<'_> {
        CalendarService::new(&self.state.config, self.state.graph.clone())
    }

    fn session_name<'b>(&'b self, booking: &'b Booking) -> &'b str {
        find_session_type(&self.state.config.practice.session_types, &booking.session_type)
            .map(|s| s.name.as_str())
            .unwrap_or(&booking.session_type)
    }

    /// Creates a PENDING booking for an open slot and notifies both parties.
    pub async fn create(
        &self,
        request: CreateBookingRequest,
        now: DateTime<Utc>,
    ) -> Result<Booking, ApiError> {
        request.validate()?;
        self.state
            .captcha
            .verify(&request.captcha_token, &request.captcha_answer)?;

        let practice = &self.state.config.practice;
        let session = find_session_type(&practice.session_types, &request.session_type)
            .ok_or_else(|| ApiError::Validation("Unknown session type".into()))?;

        let date = local_date(&practice.tz(), request.starts_at);
        let slots = AvailabilityService::new(self.state.pool.clone(), practice)
            .slots_for_date(date, session, now)
            .await?;
        let slot = find_slot(&slots, request.starts_at)
            .ok_or_else(|| ApiError::Conflict(SLOT_TAKEN.into()))?;

        let manage_token = generate_secure_token(MANAGE_TOKEN_BYTES);
        let manage_token_hash = sha256_hex(&manage_token);
        let client_email = normalize_email(&request.client_email);

        let mut attempt = 1;
        let booking: Booking = loop {
            let reference = generate_reference(BOOKING_REFERENCE_PREFIX);
            let result = self
                .bookings
                .create(&NewBooking {
                    reference: &reference,
                    client_name: request.client_name.trim(),
                    client_email: &client_email,
                    client_phone: non_empty(request.client_phone.as_deref()),
                    session_type: &session.slug,
                    starts_at: slot.starts_at,
                    ends_at: slot.ends_at,
                    message: non_empty(request.message.as_deref()),
                    manage_token_hash: &manage_token_hash,
                })
                .await;

            match result {
                Ok(entity) => break entity.into(),
                // a concurrent request took an overlapping interval
                Err(e) if violates_constraint(&e, BOOKING_OVERLAP_CONSTRAINT) => {
                    return Err(ApiError::Conflict(SLOT_TAKEN.into()));
                }
                Err(e)
                    if violates_constraint(&e, BOOKING_REFERENCE_CONSTRAINT)
                        && attempt < REFERENCE_ATTEMPTS =>
                {
                    warn!(reference = %reference, attempt, "Booking reference collision, regenerating");
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        };

        record_booking_created(&session.slug);
        info!(
            booking_id = %booking.id,
            reference = %booking.reference,
            session_type = %booking.session_type,
            starts_at = %booking.starts_at,
            "Booking request created"
        );

        let to_client = self
            .templates
            .booking_received_client(&booking, &session.name, &manage_token)
            .into_message(&booking.client_email, Some(&booking.client_name));
        self.deliver(&booking, to_client, "booking received (client)").await;

        let to_practitioner = self
            .templates
            .booking_received_practitioner(&booking, &session.name)
            .into_message(&practice.practitioner_email, Some(&practice.practitioner_name));
        let to_practitioner = EmailMessage {
            reply_to: Some(booking.client_email.clone()),
            ..to_practitioner
        };
        self.deliver(&booking, to_practitioner, "booking received (practitioner)")
            .await;

        Ok(booking)
    }

    /// Admin status change with its side effects.
    pub async fn change_status(
        &self,
        id: Uuid,
        request: UpdateBookingStatusRequest,
    ) -> Result<Booking, ApiError> {
        request.validate()?;

        let booking: Booking = self
            .bookings
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Booking not found".into()))?
            .into();

        let reason = non_empty(request.reason.as_deref());
        let updated = self
            .transition(&booking, request.status, reason)
            .await?;

        info!(
            booking_id = %id,
            from = %booking.status,
            to = %updated.status,
            notify_client = request.notify_client,
            "Booking status changed"
        );

        Ok(self
            .apply_side_effects(updated, reason, request.notify_client)
            .await)
    }

    /// Cancellation through the emailed manage link.
    pub async fn cancel_by_client(
        &self,
        reference: &str,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Booking, ApiError> {
        let not_found = || ApiError::NotFound("Booking not found".into());

        let booking: Booking = self
            .bookings
            .find_by_reference(&reference.trim().to_ascii_uppercase())
            .await?
            .ok_or_else(not_found)?
            .into();

        if !constant_time_eq(
            sha256_hex(token).as_bytes(),
            booking.manage_token_hash.as_bytes(),
        ) {
            warn!(reference = %booking.reference, "Cancellation with wrong manage token");
            return Err(not_found());
        }

        if booking.starts_at <= now {
            return Err(ApiError::Conflict(
                "Sessions that already started cannot be cancelled".into(),
            ));
        }

        let updated = self
            .transition(&booking, BookingStatus::Cancelled, None)
            .await?;
        info!(booking_id = %booking.id, reference = %booking.reference, "Booking cancelled by client");

        let updated = self
            .apply_side_effects(updated, None, true)
            .await;

        let practice = &self.state.config.practice;
        let to_practitioner = self
            .templates
            .booking_cancelled_practitioner(&updated)
            .into_message(&practice.practitioner_email, Some(&practice.practitioner_name));
        self.deliver(&updated, to_practitioner, "booking cancelled (practitioner)")
            .await;

        Ok(updated)
    }

    async fn transition(
        &self,
        booking: &Booking,
        to: BookingStatus,
        reason: Option<&str>,
    ) -> Result<Booking, ApiError> {
        booking.status.transition(to)?;

        let decline_reason = match to {
            BookingStatus::Declined | BookingStatus::Cancelled => reason,
            _ => None,
        };

        let updated: Booking = self
            .bookings
            .update_status(booking.id, booking.status.into(), to.into(), decline_reason)
            .await?
            .ok_or_else(|| {
                ApiError::Conflict("Booking was changed by another request, reload and retry".into())
            })?
            .into();

        record_booking_status_changed(to.as_str());
        Ok(updated)
    }

    async fn apply_side_effects(
        &self,
        mut booking: Booking,
        reason: Option<&str>,
        notify_client: bool,
    ) -> Booking {
        let now = Utc::now();
        let calendar = self.calendar();
        let session_name = self.session_name(&booking).to_string();

        match booking.status {
            BookingStatus::Confirmed => {
                match calendar.create_event(&booking, &session_name).await {
                    Ok(Some(event_id)) => {
                        match self
                            .bookings
                            .set_calendar_event_id(booking.id, Some(&event_id))
                            .await
                        {
                            Ok(()) => booking.calendar_event_id = Some(event_id),
                            Err(e) => {
                                warn!(booking_id = %booking.id, error = %e, "Failed to store calendar event id")
                            }
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(booking_id = %booking.id, error = %e, "Calendar event creation failed")
                    }
                }

                if notify_client {
                    let mut message = self
                        .templates
                        .booking_confirmed(&booking, &session_name)
                        .into_message(&booking.client_email, Some(&booking.client_name));
                    message
                        .attachments
                        .push(calendar.invite_attachment(&booking, &session_name, now));
                    self.deliver(&booking, message, "booking confirmed").await;
                }
            }
            BookingStatus::Declined => {
                if notify_client {
                    let message = self
                        .templates
                        .booking_declined(&booking, reason)
                        .into_message(&booking.client_email, Some(&booking.client_name));
                    self.deliver(&booking, message, "booking declined").await;
                }
            }
            BookingStatus::Cancelled => {
                if let Some(event_id) = booking.calendar_event_id.clone() {
                    match calendar.delete_event(&event_id).await {
                        Ok(()) => {
                            if let Err(e) = self.bookings.set_calendar_event_id(booking.id, None).await {
                                warn!(booking_id = %booking.id, error = %e, "Failed to clear calendar event id");
                            } else {
                                booking.calendar_event_id = None;
                            }
                        }
                        Err(e) => {
                            warn!(booking_id = %booking.id, error = %e, "Calendar event deletion failed")
                        }
                    }
                }

                if notify_client {
                    let mut message = self
                        .templates
                        .booking_cancelled_client(&booking, reason)
                        .into_message(&booking.client_email, Some(&booking.client_name));
                    message
                        .attachments
                        .push(calendar.cancellation_attachment(&booking, &session_name, now));
                    self.deliver(&booking, message, "booking cancelled").await;
                }
            }
            BookingStatus::Pending | BookingStatus::Completed => {}
        }

        booking
    }

    async fn deliver(&self, booking: &Booking, message: EmailMessage, kind: &'static str) {
        if let Err(e) = self.state.email.send(message).await {
            warn!(
                booking_id = %booking.id,
                reference = %booking.reference,
                email = kind,
                error = %e,
                "Booking email failed"
            );
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
