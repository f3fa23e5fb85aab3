//! Session types offered by the practice.

use serde::{Deserialize, Serialize};

/// A bookable session from the configured catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionType {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub duration_minutes: u32,
    #[serde(default)]
    pub price_cents: u32,
}

impl SessionType {
    pub fn duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.duration_minutes))
    }
}

/// Looks up a session type by slug.
pub fn find_session_type<'a>(catalog: &'a [SessionType], slug: &str) -> Option<&'a SessionType> {
    catalog.iter().find(|s| s.slug == slug)
}
