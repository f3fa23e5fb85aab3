//! iCalendar (RFC 5545) invites attached to booking emails.

use chrono::{DateTime, Utc};
use uuid::Uuid;

const ICS_DATETIME_FORMAT: &str = "%Y%m%dT%H%M%SZ";
const PRODID: &str = "-//Practice Site//Booking//EN";
const MAX_LINE_OCTETS: usize = 75;

/// Everything needed to describe one session in a calendar file.
#[derive(Debug, Clone)]
pub struct InviteDetails {
    pub booking_id: Uuid,
    /// Domain part of the UID, usually the practice website host.
    pub uid_domain: String,
    pub summary: String,
    pub description: String,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub organizer_name: String,
    pub organizer_email: String,
    pub attendee_name: String,
    pub attendee_email: String,
    pub created_at: DateTime<Utc>,
}

impl InviteDetails {
    /// Stable UID so the cancellation replaces the original invite.
    pub fn uid(&self) -> String {
        format!("{}@{}", self.booking_id, self.uid_domain)
    }
}

/// Calendar file with `METHOD:REQUEST` for a confirmed booking.
pub fn booking_invite(details: &InviteDetails, now: DateTime<Utc>) -> String {
    render(details, now, Method::Request)
}

/// Calendar file with `METHOD:CANCEL` that removes the original invite.
pub fn booking_cancellation(details: &InviteDetails, now: DateTime<Utc>) -> String {
    render(details, now, Method::Cancel)
}

#[derive(Clone, Copy)]
enum Method {
    Request,
    Cancel,
}

fn render(details: &InviteDetails, now: DateTime<Utc>, method: Method) -> String {
    let (method_name, status, sequence) = match method {
        Method::Request => ("REQUEST", "CONFIRMED", 0),
        Method::Cancel => ("CANCEL", "CANCELLED", 1),
    };

    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        format!("PRODID:{}", PRODID),
        "VERSION:2.0".to_string(),
        "CALSCALE:GREGORIAN".to_string(),
        format!("METHOD:{}", method_name),
        "BEGIN:VEVENT".to_string(),
        format!("UID:{}", details.uid()),
        format!("DTSTAMP:{}", format_utc(now)),
        format!("CREATED:{}", format_utc(details.created_at)),
        format!("DTSTART:{}", format_utc(details.starts_at)),
        format!("DTEND:{}", format_utc(details.ends_at)),
        format!("SEQUENCE:{}", sequence),
        format!("STATUS:{}", status),
        format!("SUMMARY:{}", escape_text(&details.summary)),
        format!("DESCRIPTION:{}", escape_text(&details.description)),
    ];
    if let Some(location) = &details.location {
        lines.push(format!("LOCATION:{}", escape_text(location)));
    }
    lines.push(format!(
        "ORGANIZER;CN={}:mailto:{}",
        quote_param(&details.organizer_name),
        details.organizer_email
    ));
    lines.push(format!(
        "ATTENDEE;CN={};ROLE=REQ-PARTICIPANT;PARTSTAT=NEEDS-ACTION;RSVP=TRUE:mailto:{}",
        quote_param(&details.attendee_name),
        details.attendee_email
    ));
    lines.push("TRANSP:OPAQUE".to_string());
    lines.push("END:VEVENT".to_string());
    lines.push("END:VCALENDAR".to_string());

    let mut out = String::new();
    for line in lines {
        out.push_str(&fold_line(&line));
        out.push_str("\r\n");
    }
    out
}

pub fn format_utc(dt: DateTime<Utc>) -> String {
    dt.format(ICS_DATETIME_FORMAT).to_string()
}

/// Escapes a TEXT value: backslash, semicolon, comma and newlines.
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str("\\n");
            }
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

/// Parameter values containing `:`, `;` or `,` must be quoted; quotes are
/// not allowed inside.
fn quote_param(value: &str) -> String {
    let cleaned: String = value.chars().filter(|c| *c != '"' && !c.is_control()).collect();
    if cleaned.contains([':', ';', ',']) {
        format!("\"{}\"", cleaned)
    } else {
        cleaned
    }
}

/// Folds a content line at 75 octets without splitting UTF-8 sequences.
/// Continuation lines start with a single space.
pub fn fold_line(line: &str) -> String {
    if line.len() <= MAX_LINE_OCTETS {
        return line.to_string();
    }

    let mut out = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3);
    let mut current = 0;
    // first line holds 75 octets, continuations 74 plus the leading space
    let mut limit = MAX_LINE_OCTETS;
    for c in line.chars() {
        let len = c.len_utf8();
        if current + len > limit {
            out.push_str("\r\n ");
            current = 0;
            limit = MAX_LINE_OCTETS - 1;
        }
        out.push(c);
        current += len;
    }
    out
}
