//! Weekly availability template, blocked dates and computed time slots.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Serde helpers for wall-clock times as `HH:MM`.
///
/// Deserialization also accepts `HH:MM:SS`.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse(&s).map_err(serde::de::Error::custom)
    }

    pub fn parse(s: &str) -> Result<NaiveTime, String> {
        NaiveTime::parse_from_str(s, FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
            .map_err(|_| format!("invalid time '{}', expected HH:MM", s))
    }
}

/// Day of week numbering: 0 = Monday ... 6 = Sunday.
pub fn weekday_index(date: NaiveDate) -> i16 {
    use chrono::Datelike;
    date.weekday().num_days_from_monday() as i16
}

/// A recurring block of working hours on one weekday, in practice-local time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AvailabilityWindow {
    pub id: Uuid,
    pub day_of_week: i16,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A whole day with no bookings (holiday, conference, sick day).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BlockedDate {
    pub id: Uuid,
    pub date: NaiveDate,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An open, bookable slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct TimeSlot {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    /// Start in practice-local wall-clock time.
    #[serde(with = "hhmm")]
    pub local_time: NaiveTime,
}

fn default_active() -> bool {
    true
}

fn validate_window_order(window: &AvailabilityWindowInput) -> Result<(), ValidationError> {
    if window.start_time < window.end_time {
        Ok(())
    } else {
        let mut err = ValidationError::new("window_order");
        err.message = Some("Start time must be before end time".into());
        Err(err)
    }
}

/// One window of the weekly template as sent by the admin panel.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_window_order", skip_on_field_errors = false))]
pub struct AvailabilityWindowInput {
    #[validate(range(min = 0, max = 6, message = "Day of week must be 0 (Monday) to 6 (Sunday)"))]
    pub day_of_week: i16,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// Replaces the entire weekly template.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReplaceAvailabilityRequest {
    #[validate(length(max = 50, message = "At most 50 windows"))]
    #[validate(nested)]
    pub windows: Vec<AvailabilityWindowInput>,
}

impl ReplaceAvailabilityRequest {
    /// Returns the first pair of active windows on the same day that overlap.
    pub fn find_overlap(&self) -> Option<(&AvailabilityWindowInput, &AvailabilityWindowInput)> {
        let mut active: Vec<&AvailabilityWindowInput> =
            self.windows.iter().filter(|w| w.is_active).collect();
        active.sort_by_key(|w| (w.day_of_week, w.start_time));
        active
            .windows(2)
            .find(|pair| {
                pair[0].day_of_week == pair[1].day_of_week && pair[1].start_time < pair[0].end_time
            })
            .map(|pair| (pair[0], pair[1]))
    }
}

fn validate_update_order(update: &UpdateAvailabilityWindowRequest) -> Result<(), ValidationError> {
    match (update.start_time, update.end_time) {
        (Some(start), Some(end)) if start >= end => {
            let mut err = ValidationError::new("window_order");
            err.message = Some("Start time must be before end time".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

/// Partial update of one window. Ordering against stored values is checked
/// after merging.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[validate(schema(function = "validate_update_order", skip_on_field_errors = false))]
pub struct UpdateAvailabilityWindowRequest {
    #[validate(range(min = 0, max = 6, message = "Day of week must be 0 (Monday) to 6 (Sunday)"))]
    pub day_of_week: Option<i16>,
    #[serde(default, deserialize_with = "hhmm_opt::deserialize")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, deserialize_with = "hhmm_opt::deserialize")]
    pub end_time: Option<NaiveTime>,
    pub is_active: Option<bool>,
}

mod hhmm_opt {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|s| super::hhmm::parse(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// Request payload for blocking a date.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBlockedDateRequest {
    pub date: NaiveDate,
    #[validate(length(max = 200, message = "Reason must be at most 200 characters"))]
    pub reason: Option<String>,
}

/// Query for blocked dates in a range.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlockedDatesQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Public slot query for one date.
#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
    pub session_type: String,
}

/// Public calendar query for a date range.
#[derive(Debug, Clone, Deserialize)]
pub struct AvailableDaysQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub session_type: String,
}

/// Slots for one date.
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityResponse {
    pub date: NaiveDate,
    pub session_type: String,
    pub timezone: String,
    pub slots: Vec<TimeSlot>,
}

/// Dates in a range that have at least one open slot.
#[derive(Debug, Clone, Serialize)]
pub struct AvailableDaysResponse {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub session_type: String,
    pub timezone: String,
    pub dates: Vec<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn input(day: i16, start: NaiveTime, end: NaiveTime) -> AvailabilityWindowInput {
        AvailabilityWindowInput {
            day_of_week: day,
            start_time: start,
            end_time: end,
            is_active: true,
        }
    }

    #[test]
    fn test_weekday_index_monday_is_zero() {
        let monday = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let sunday = NaiveDate::from_ymd_opt(2024, 6, 9).unwrap();
        assert_eq!(weekday_index(monday), 0);
        assert_eq!(weekday_index(sunday), 6);
    }

    #[test]
    fn test_hhmm_parse() {
        assert_eq!(hhmm::parse("09:30").unwrap(), t(9, 30));
        assert_eq!(hhmm::parse("17:00:00").unwrap(), t(17, 0));
        assert!(hhmm::parse("25:00").is_err());
        assert!(hhmm::parse("nine").is_err());
    }

    #[test]
    fn test_window_input_deserialize() {
        let w: AvailabilityWindowInput = serde_json::from_str(
            r#"{"day_of_week": 2, "start_time": "09:00", "end_time": "12:30"}"#,
        )
        .unwrap();
        assert_eq!(w.start_time, t(9, 0));
        assert_eq!(w.end_time, t(12, 30));
        assert!(w.is_active);
        assert!(w.validate().is_ok());
    }

    #[test]
    fn test_window_order_validated() {
        assert!(input(1, t(12, 0), t(9, 0)).validate().is_err());
        assert!(input(1, t(9, 0), t(9, 0)).validate().is_err());
        assert!(input(7, t(9, 0), t(10, 0)).validate().is_err());
    }

    #[test]
    fn test_nested_validation_in_replace() {
        let request = ReplaceAvailabilityRequest {
            windows: vec![input(0, t(9, 0), t(12, 0)), input(0, t(14, 0), t(13, 0))],
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_find_overlap() {
        let ok = ReplaceAvailabilityRequest {
            windows: vec![
                input(0, t(14, 0), t(17, 0)),
                input(0, t(9, 0), t(12, 0)),
                input(1, t(9, 0), t(17, 0)),
            ],
        };
        assert!(ok.find_overlap().is_none());

        let touching = ReplaceAvailabilityRequest {
            windows: vec![input(3, t(9, 0), t(12, 0)), input(3, t(12, 0), t(15, 0))],
        };
        assert!(touching.find_overlap().is_none());

        let overlapping = ReplaceAvailabilityRequest {
            windows: vec![input(3, t(9, 0), t(12, 0)), input(3, t(11, 0), t(15, 0))],
        };
        let (a, b) = overlapping.find_overlap().unwrap();
        assert_eq!(a.start_time, t(9, 0));
        assert_eq!(b.start_time, t(11, 0));
    }

    #[test]
    fn test_inactive_windows_ignored_for_overlap() {
        let mut second = input(3, t(10, 0), t(11, 0));
        second.is_active = false;
        let request = ReplaceAvailabilityRequest {
            windows: vec![input(3, t(9, 0), t(12, 0)), second],
        };
        assert!(request.find_overlap().is_none());
    }

    #[test]
    fn test_update_order() {
        let update = UpdateAvailabilityWindowRequest {
            start_time: Some(t(15, 0)),
            end_time: Some(t(10, 0)),
            ..Default::default()
        };
        assert!(update.validate().is_err());

        let partial: UpdateAvailabilityWindowRequest =
            serde_json::from_str(r#"{"end_time": "18:00"}"#).unwrap();
        assert_eq!(partial.end_time, Some(t(18, 0)));
        assert!(partial.start_time.is_none());
        assert!(partial.validate().is_ok());
    }

    #[test]
    fn test_time_slot_serializes_local_time() {
        let start = DateTime::parse_from_rfc3339("2024-06-03T07:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let slot = TimeSlot {
            starts_at: start,
            ends_at: start + chrono::Duration::minutes(50),
            local_time: t(9, 0),
        };
        let json = serde_json::to_value(slot).unwrap();
        assert_eq!(json["local_time"], "09:00");
    }
}
