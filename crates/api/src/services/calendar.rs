//! Calendar integration: `.ics` attachments and practitioner calendar events.

use chrono::{DateTime, Utc};
use domain::models::Booking;
use domain::services::calendar_invite::{booking_cancellation, booking_invite, InviteDetails};
use std::sync::Arc;

use crate::config::Config;
use crate::services::email::EmailAttachment;
use crate::services::graph::{CalendarEvent, GraphClient, GraphError};

/// Builds calendar files and, when enabled, mirrors bookings into the
/// practitioner's Graph calendar.
pub struct CalendarService<'a> {
    config: &'a Config,
    graph: Option<Arc<GraphClient>>,
}

impl<'a> CalendarService<'a> {
    /// `graph` is ignored unless `calendar.enabled` is set.
    pub fn new(config: &'a Config, graph: Option<Arc<GraphClient>>) -> Self {
        let graph = graph.filter(|_| config.calendar.enabled);
        Self { config, graph }
    }

    pub fn is_enabled(&self) -> bool {
        self.graph.is_some()
    }

    pub fn invite_details(&self, booking: &Booking, session_name: &str) -> InviteDetails {
        let practice = &self.config.practice;
        InviteDetails {
            booking_id: booking.id,
            uid_domain: uid_domain(&self.config.server.public_base_url),
            summary: format!("{} with {}", session_name, practice.practitioner_name),
            description: format!(
                "{} ({})\nReference: {}",
                session_name, practice.name, booking.reference
            ),
            location: practice.location.clone(),
            starts_at: booking.starts_at,
            ends_at: booking.ends_at,
            organizer_name: practice.practitioner_name.clone(),
            organizer_email: practice.practitioner_email.clone(),
            attendee_name: booking.client_name.clone(),
            attendee_email: booking.client_email.clone(),
            created_at: booking.created_at,
        }
    }

    /// `invite.ics` with `METHOD:REQUEST`.
    pub fn invite_attachment(
        &self,
        booking: &Booking,
        session_name: &str,
        now: DateTime<Utc>,
    ) -> EmailAttachment {
        let ics = booking_invite(&self.invite_details(booking, session_name), now);
        EmailAttachment::ics("invite.ics", "REQUEST", ics)
    }

    /// `cancel.ics` with `METHOD:CANCEL`, same UID as the invite.
    pub fn cancellation_attachment(
        &self,
        booking: &Booking,
        session_name: &str,
        now: DateTime<Utc>,
    ) -> EmailAttachment {
        let ics = booking_cancellation(&self.invite_details(booking, session_name), now);
        EmailAttachment::ics("cancel.ics", "CANCEL", ics)
    }

    /// Creates the calendar event. `Ok(None)` when the integration is off.
    pub async fn create_event(
        &self,
        booking: &Booking,
        session_name: &str,
    ) -> Result<Option<String>, GraphError> {
        let Some(graph) = &self.graph else {
            return Ok(None);
        };
        let details = self.invite_details(booking, session_name);
        let event = CalendarEvent {
            subject: format!("{}: {}", session_name, booking.client_name),
            body: details.description,
            starts_at: booking.starts_at,
            ends_at: booking.ends_at,
            location: details.location,
            attendee_email: booking.client_email.clone(),
            attendee_name: booking.client_name.clone(),
            transaction_id: booking.id.to_string(),
        };
        let event_id = graph.create_event(&event).await?;
        tracing::info!(booking_id = %booking.id, event_id = %event_id, "Calendar event created");
        Ok(Some(event_id))
    }

    pub async fn delete_event(&self, event_id: &str) -> Result<(), GraphError> {
        match &self.graph {
            Some(graph) => graph.delete_event(event_id).await,
            None => Ok(()),
        }
    }
}

/// Host part of the public URL, used as the iCalendar UID domain.
fn uid_domain(public_base_url: &str) -> String {
    let without_scheme = public_base_url
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(public_base_url);
    let host = without_scheme
        .split(['/', ':'])
        .next()
        .unwrap_or_default();
    if host.is_empty() {
        "localhost".to_string()
    } else {
        host.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uid_domain() {
        assert_eq!(uid_domain("https://praxis.test"), "praxis.test");
        assert_eq!(uid_domain("https://praxis.test:8443/app"), "praxis.test");
        assert_eq!(uid_domain("praxis.test/"), "praxis.test");
        assert_eq!(uid_domain(""), "localhost");
    }

    #[test]
    fn test_disabled_without_flag() {
        let config = Config::load_for_test(&[]).unwrap();
        let calendar = CalendarService::new(&config, None);
        assert!(!calendar.is_enabled());
    }
}
