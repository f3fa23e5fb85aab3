//! Matching inbound email to booking and contact conversations.
//!
//! Outgoing mail carries a reference tag such as `[BK-7F3A9C]` in the
//! subject. Replies keep the tag, so most mail is matched from the subject
//! alone. Auto-replies, bounces and our own mail are filtered out first.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::models::booking::BOOKING_REFERENCE_PREFIX;
use crate::models::contact::CONTACT_REFERENCE_PREFIX;

lazy_static! {
    static ref REFERENCE_RE: Regex =
        Regex::new(r"(?i)\b(BK|CT)-([A-Z0-9]{6})\b").expect("valid reference regex");
    static ref REPLY_PREFIX_RE: Regex =
        Regex::new(r"(?i)^\s*(re|fw|fwd|aw|wg|sv|antw)\s*(\[\d+\])?\s*:\s*")
            .expect("valid reply prefix regex");
    static ref ON_WROTE_RE: Regex =
        Regex::new(r"(?i)^\s*on\s.+wrote:\s*$").expect("valid attribution regex");
    static ref AM_SCHRIEB_RE: Regex =
        Regex::new(r"(?i)^\s*am\s.+schrieb.*:\s*$").expect("valid attribution regex");
}

/// An email fetched from the practice mailbox.
#[derive(Debug, Clone)]
pub struct InboundEmail {
    /// Provider message id (Graph `id` or `internetMessageId`).
    pub external_id: String,
    pub from_address: String,
    pub from_name: Option<String>,
    pub subject: String,
    pub body: String,
    pub received_at: DateTime<Utc>,
    pub headers: Vec<(String, String)>,
}

impl InboundEmail {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Which conversation a reference points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "reference", rename_all = "snake_case")]
pub enum ConversationRef {
    Booking(String),
    Contact(String),
}

impl ConversationRef {
    pub fn reference(&self) -> &str {
        match self {
            ConversationRef::Booking(r) | ConversationRef::Contact(r) => r,
        }
    }
}

/// Why a message was skipped without attaching it anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoReplyReason {
    AutoSubmittedHeader,
    AutoReplyHeader,
    PrecedenceHeader,
    SuppressHeader,
    SubjectPrefix,
    SystemSender,
    OwnMailbox,
}

/// Outcome of classifying one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchDecision {
    Skip(AutoReplyReason),
    Tagged(ConversationRef),
    Untagged,
}

const AUTO_REPLY_SUBJECT_PREFIXES: &[&str] = &[
    "automatic reply",
    "auto-reply",
    "autoreply",
    "auto reply",
    "auto:",
    "out of office",
    "abwesenheitsnotiz",
    "automatische antwort",
    "undeliverable",
    "delivery status notification",
    "mail delivery failed",
    "returned mail",
];

const SYSTEM_SENDER_LOCAL_PARTS: &[&str] = &[
    "mailer-daemon",
    "postmaster",
    "noreply",
    "no-reply",
    "donotreply",
    "do-not-reply",
];

/// Finds the first booking or contact reference in a subject line.
///
/// Accepts `[BK-7F3A9C]`, `Ref: bk-7f3a9c` and bare references; the result
/// is uppercased.
pub fn extract_reference(subject: &str) -> Option<ConversationRef> {
    let caps = REFERENCE_RE.captures(subject)?;
    let prefix = caps.get(1)?.as_str().to_ascii_uppercase();
    let code = caps.get(2)?.as_str().to_ascii_uppercase();
    let reference = format!("{}-{}", prefix, code);

    if prefix == BOOKING_REFERENCE_PREFIX {
        Some(ConversationRef::Booking(reference))
    } else if prefix == CONTACT_REFERENCE_PREFIX {
        Some(ConversationRef::Contact(reference))
    } else {
        None
    }
}

/// Subject tag appended to outgoing mail.
pub fn subject_tag(reference: &str) -> String {
    format!("[{}]", reference)
}

/// Appends the reference tag unless the subject already carries it.
pub fn tag_subject(subject: &str, reference: &str) -> String {
    if subject.to_ascii_uppercase().contains(&reference.to_ascii_uppercase()) {
        subject.to_string()
    } else {
        format!("{} {}", subject.trim_end(), subject_tag(reference))
    }
}

/// Strips any number of leading `Re:`, `Fwd:`, `AW:`, `WG:` style prefixes.
pub fn normalize_subject(subject: &str) -> String {
    let mut s = subject.trim();
    while let Some(m) = REPLY_PREFIX_RE.find(s) {
        s = s[m.end()..].trim_start();
    }
    s.to_string()
}

fn local_part(address: &str) -> String {
    address
        .trim()
        .rsplit_once('@')
        .map(|(local, _)| local)
        .unwrap_or(address)
        .trim_start_matches('<')
        .to_ascii_lowercase()
}

/// Detects auto-replies, bounces and bulk mail.
pub fn is_auto_reply(email: &InboundEmail) -> Option<AutoReplyReason> {
    if let Some(v) = email.header("Auto-Submitted") {
        if !v.trim().eq_ignore_ascii_case("no") {
            return Some(AutoReplyReason::AutoSubmittedHeader);
        }
    }
    if email.header("X-Autoreply").is_some() || email.header("X-Autorespond").is_some() {
        return Some(AutoReplyReason::AutoReplyHeader);
    }
    if let Some(v) = email.header("Precedence") {
        let v = v.trim().to_ascii_lowercase();
        if matches!(v.as_str(), "bulk" | "junk" | "list" | "auto_reply") {
            return Some(AutoReplyReason::PrecedenceHeader);
        }
    }
    if let Some(v) = email.header("X-Auto-Response-Suppress") {
        let suppressed = v
            .split(',')
            .map(|p| p.trim().to_ascii_lowercase())
            .any(|p| matches!(p.as_str(), "all" | "oof" | "autoreply"));
        if suppressed {
            return Some(AutoReplyReason::SuppressHeader);
        }
    }

    let subject = email.subject.trim().to_lowercase();
    if AUTO_REPLY_SUBJECT_PREFIXES
        .iter()
        .any(|p| subject.starts_with(p))
    {
        return Some(AutoReplyReason::SubjectPrefix);
    }

    let local = local_part(&email.from_address);
    if SYSTEM_SENDER_LOCAL_PARTS.contains(&local.as_str()) || local.starts_with("bounce") {
        return Some(AutoReplyReason::SystemSender);
    }

    None
}

/// Cuts the quoted history from a reply and returns only the new text.
///
/// Falls back to the trimmed original when nothing would be left.
pub fn strip_quoted_reply(body: &str) -> String {
    let lines: Vec<&str> = body.lines().collect();
    let mut kept: Vec<&str> = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();

        if ON_WROTE_RE.is_match(trimmed) || AM_SCHRIEB_RE.is_match(trimmed) {
            break;
        }
        if trimmed.starts_with("-----Original Message-----")
            || trimmed.starts_with("-----Ursprüngliche Nachricht-----")
        {
            break;
        }
        if trimmed.len() >= 10 && trimmed.chars().all(|c| c == '_') {
            break;
        }
        if is_header_block_start(trimmed, lines.get(i + 1..).unwrap_or(&[])) {
            break;
        }
        if trimmed.starts_with('>') {
            continue;
        }
        kept.push(line.trim_end());
    }

    let text = kept.join("\n").trim().to_string();
    if text.is_empty() {
        body.trim().to_string()
    } else {
        text
    }
}

/// Outlook-style quoted header: `From:` followed within a few lines by
/// `Sent:` or `Date:`.
fn is_header_block_start(line: &str, rest: &[&str]) -> bool {
    let lower = line.to_ascii_lowercase();
    if !(lower.starts_with("from:") || lower.starts_with("von:")) {
        return false;
    }
    rest.iter().take(3).any(|l| {
        let l = l.trim().to_ascii_lowercase();
        l.starts_with("sent:") || l.starts_with("date:") || l.starts_with("gesendet:")
    })
}

/// Classifies an inbound message.
///
/// `own_addresses` are the practice's sending addresses; mail from them is
/// never treated as a client reply.
pub fn classify(email: &InboundEmail, own_addresses: &[String]) -> MatchDecision {
    let from = email.from_address.trim().to_lowercase();
    if own_addresses.iter().any(|a| a.trim().eq_ignore_ascii_case(&from)) {
        return MatchDecision::Skip(AutoReplyReason::OwnMailbox);
    }
    if let Some(reason) = is_auto_reply(email) {
        return MatchDecision::Skip(reason);
    }
    match extract_reference(&email.subject) {
        Some(reference) => MatchDecision::Tagged(reference),
        None => MatchDecision::Untagged,
    }
}
