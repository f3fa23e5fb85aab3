//! Plain-text and HTML bodies for booking and contact emails.
//!
//! Every subject carries the conversation tag (`[BK-XXXXXX]`) so replies can
//! be matched back by the inbox sync.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use domain::models::{Booking, ContactSubmission};
use domain::services::reply_matching::tag_subject;

use crate::config::Config;
use crate::services::email::EmailMessage;

/// Practice details shared by all templates.
#[derive(Debug, Clone)]
pub struct TemplateContext {
    pub practice_name: String,
    pub practitioner_name: String,
    pub timezone: Tz,
    pub public_base_url: String,
}

/// A rendered email without recipients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub body_text: String,
    pub body_html: String,
}

impl RenderedEmail {
    pub fn into_message(self, to: &str, to_name: Option<&str>) -> EmailMessage {
        EmailMessage {
            to: to.to_string(),
            to_name: to_name.map(str::to_string),
            subject: self.subject,
            body_text: self.body_text,
            body_html: Some(self.body_html),
            reply_to: None,
            attachments: Vec::new(),
        }
    }
}

impl TemplateContext {
    pub fn from_config(config: &Config) -> Self {
        Self {
            practice_name: config.practice.name.clone(),
            practitioner_name: config.practice.practitioner_name.clone(),
            timezone: config.practice.tz(),
            public_base_url: config.server.public_base_url.clone(),
        }
    }

    fn local_time(&self, instant: DateTime<Utc>) -> String {
        instant
            .with_timezone(&self.timezone)
            .format("%A, %d %B %Y, %H:%M")
            .to_string()
    }

    fn signature(&self) -> String {
        format!("Kind regards,\n{}\n{}", self.practitioner_name, self.practice_name)
    }

    fn render(&self, subject: String, reference: &str, paragraphs: &[String]) -> RenderedEmail {
        let mut body_text = paragraphs.join("\n\n");
        body_text.push_str("\n\n");
        body_text.push_str(&self.signature());

        let html_paragraphs: String = paragraphs
            .iter()
            .map(|p| format!("<p>{}</p>", escape_html(p).replace('\n', "<br>")))
            .collect();
        let body_html = format!(
            "<!DOCTYPE html>\n<html><body style=\"font-family: sans-serif; line-height: 1.5; color: #222;\">\
             <h2>{practice}</h2>{paragraphs}<p>{signature}</p></body></html>",
            practice = escape_html(&self.practice_name),
            paragraphs = html_paragraphs,
            signature = escape_html(&self.signature()).replace('\n', "<br>"),
        );

        RenderedEmail {
            subject: tag_subject(&subject, reference),
            body_text,
            body_html,
        }
    }

    fn session_line(&self, booking: &Booking, session_name: &str) -> String {
        format!(
            "Session: {}\nWhen: {} ({})\nReference: {}",
            session_name,
            self.local_time(booking.starts_at),
            self.timezone.name(),
            booking.reference
        )
    }

    fn cancel_link(&self, booking: &Booking, manage_token: &str) -> String {
        format!(
            "{}/booking/cancel?reference={}&token={}",
            self.public_base_url.trim_end_matches('/'),
            booking.reference,
            manage_token
        )
    }

    /// Acknowledgement sent to the client right after booking.
    pub fn booking_received_client(
        &self,
        booking: &Booking,
        session_name: &str,
        manage_token: &str,
    ) -> RenderedEmail {
        self.render(
            "Your booking request was received".to_string(),
            &booking.reference,
            &[
                format!("Hello {},", booking.client_name),
                "thank you for your booking request. I will confirm it shortly.".to_string(),
                self.session_line(booking, session_name),
                format!(
                    "If you need to cancel, use this link:\n{}",
                    self.cancel_link(booking, manage_token)
                ),
            ],
        )
    }

    /// Notification sent to the practitioner about a new booking.
    pub fn booking_received_practitioner(&self, booking: &Booking, session_name: &str) -> RenderedEmail {
        let mut paragraphs = vec![
            format!(
                "New booking request from {} <{}>.",
                booking.client_name, booking.client_email
            ),
            self.session_line(booking, session_name),
        ];
        if let Some(phone) = &booking.client_phone {
            paragraphs.push(format!("Phone: {}", phone));
        }
        if let Some(message) = &booking.message {
            paragraphs.push(format!("Message:\n{}", message));
        }
        self.render(
            format!("New booking request: {}", booking.client_name),
            &booking.reference,
            &paragraphs,
        )
    }

    pub fn booking_confirmed(&self, booking: &Booking, session_name: &str) -> RenderedEmail {
        self.render(
            "Your session is confirmed".to_string(),
            &booking.reference,
            &[
                format!("Hello {},", booking.client_name),
                "your session is confirmed. The calendar invitation is attached.".to_string(),
                self.session_line(booking, session_name),
            ],
        )
    }

    pub fn booking_declined(&self, booking: &Booking, reason: Option<&str>) -> RenderedEmail {
        let mut paragraphs = vec![
            format!("Hello {},", booking.client_name),
            format!(
                "unfortunately I cannot offer the requested time on {}.",
                self.local_time(booking.starts_at)
            ),
        ];
        if let Some(reason) = reason.filter(|r| !r.trim().is_empty()) {
            paragraphs.push(format!("Reason: {}", reason));
        }
        paragraphs.push("Feel free to choose another time on the website.".to_string());
        self.render(
            "Your booking request".to_string(),
            &booking.reference,
            &paragraphs,
        )
    }

    pub fn booking_cancelled_client(&self, booking: &Booking, reason: Option<&str>) -> RenderedEmail {
        let mut paragraphs = vec![
            format!("Hello {},", booking.client_name),
            format!(
                "the session on {} ({}) has been cancelled.",
                self.local_time(booking.starts_at),
                booking.reference
            ),
        ];
        if let Some(reason) = reason.filter(|r| !r.trim().is_empty()) {
            paragraphs.push(format!("Reason: {}", reason));
        }
        self.render(
            "Your session was cancelled".to_string(),
            &booking.reference,
            &paragraphs,
        )
    }

    /// Sent to the practitioner when a client cancels through the manage link.
    pub fn booking_cancelled_practitioner(&self, booking: &Booking) -> RenderedEmail {
        self.render(
            format!("Booking cancelled by client: {}", booking.client_name),
            &booking.reference,
            &[format!(
                "{} <{}> cancelled the session on {}.",
                booking.client_name,
                booking.client_email,
                self.local_time(booking.starts_at)
            )],
        )
    }

    pub fn contact_received(&self, contact: &ContactSubmission) -> RenderedEmail {
        self.render(
            "Thank you for your message".to_string(),
            &contact.reference,
            &[
                format!("Hello {},", contact.name),
                "thank you for getting in touch. I will reply as soon as possible.".to_string(),
                format!("Your message:\n{}", contact.message),
            ],
        )
    }

    pub fn contact_notification(&self, contact: &ContactSubmission) -> RenderedEmail {
        let mut paragraphs = vec![format!("From: {} <{}>", contact.name, contact.email)];
        if let Some(phone) = &contact.phone {
            paragraphs.push(format!("Phone: {}", phone));
        }
        paragraphs.push(format!("Subject: {}", contact.subject));
        paragraphs.push(contact.message.clone());
        self.render(
            format!("New contact message: {}", contact.subject),
            &contact.reference,
            &paragraphs,
        )
    }

    /// Admin reply inside an existing conversation.
    pub fn reply(&self, reference: &str, subject: &str, recipient_name: &str, body: &str) -> RenderedEmail {
        self.render(
            subject.to_string(),
            reference,
            &[format!("Hello {},", recipient_name), body.trim().to_string()],
        )
    }
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
