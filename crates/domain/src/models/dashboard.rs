//! Admin dashboard summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Booking counts by status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BookingCounts {
    pub pending: i64,
    pub confirmed: i64,
    pub declined: i64,
    pub cancelled: i64,
    pub completed: i64,
    /// Confirmed sessions starting in the next 7 days
    pub upcoming_week: i64,
    pub with_unread_reply: i64,
}

/// Contact submission counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ContactCounts {
    pub new: i64,
    pub total: i64,
    pub with_unread_reply: i64,
}

/// Content counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ContentCounts {
    pub published_posts: i64,
    pub draft_posts: i64,
    pub approved_testimonials: i64,
    pub pending_testimonials: i64,
}

/// Everything the dashboard landing page shows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DashboardSummary {
    pub bookings: BookingCounts,
    pub contacts: ContactCounts,
    pub content: ContentCounts,
    pub generated_at: DateTime<Utc>,
}

impl DashboardSummary {
    /// Items that need the practitioner's attention.
    pub fn needs_attention(&self) -> i64 {
        self.bookings.pending
            + self.bookings.with_unread_reply
            + self.contacts.new
            + self.contacts.with_unread_reply
    }
}
