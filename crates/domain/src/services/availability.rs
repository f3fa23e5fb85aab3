//! Open slot computation.
//!
//! A day's slots are the weekly windows for that weekday, stepped on a fixed
//! grid, converted from practice-local time to UTC, minus anything that
//! overlaps an existing booking. Blocked dates have no slots at all.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::collections::HashSet;

use crate::models::availability::{weekday_index, AvailabilityWindow, TimeSlot};

/// A time range already taken by a PENDING or CONFIRMED booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookedInterval {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl BookedInterval {
    /// Half-open overlap: touching intervals do not overlap.
    pub fn overlaps(&self, starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> bool {
        self.starts_at < ends_at && starts_at < self.ends_at
    }
}

/// Grid and booking-window parameters.
#[derive(Debug, Clone)]
pub struct SlotParams {
    pub duration: Duration,
    pub interval: Duration,
    pub timezone: Tz,
    /// Slots starting before this instant are not offered (now + notice).
    pub earliest_start: DateTime<Utc>,
    /// Slots starting after this instant are not offered (booking horizon).
    pub latest_start: Option<DateTime<Utc>>,
}

impl SlotParams {
    pub fn new(
        duration_minutes: u32,
        interval_minutes: u32,
        timezone: Tz,
        now: DateTime<Utc>,
        min_notice_hours: u32,
        horizon_days: Option<u32>,
    ) -> Self {
        Self {
            duration: Duration::minutes(i64::from(duration_minutes)),
            interval: Duration::minutes(i64::from(interval_minutes.max(1))),
            timezone,
            earliest_start: now + Duration::hours(i64::from(min_notice_hours)),
            latest_start: horizon_days.map(|d| now + Duration::days(i64::from(d))),
        }
    }

    fn accepts_start(&self, starts_at: DateTime<Utc>) -> bool {
        starts_at >= self.earliest_start && self.latest_start.map_or(true, |l| starts_at <= l)
    }
}

/// Converts a practice-local wall-clock time to UTC.
///
/// Returns `None` for times skipped by a DST jump. Ambiguous times (clocks
/// going back) resolve to the earlier instant.
pub fn local_to_utc(tz: &Tz, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// The practice-local date of an instant.
pub fn local_date(tz: &Tz, instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(tz).date_naive()
}

/// Computes the open slots for one local date.
///
/// `windows` may contain the whole weekly template; only active windows for
/// the date's weekday are used.
pub fn compute_open_slots(
    date: NaiveDate,
    windows: &[AvailabilityWindow],
    blocked: bool,
    booked: &[BookedInterval],
    params: &SlotParams,
) -> Vec<TimeSlot> {
    if blocked || params.duration <= Duration::zero() {
        return Vec::new();
    }

    let weekday = weekday_index(date);
    let mut day_windows: Vec<&AvailabilityWindow> = windows
        .iter()
        .filter(|w| w.is_active && w.day_of_week == weekday && w.start_time < w.end_time)
        .collect();
    day_windows.sort_by_key(|w| w.start_time);

    let mut slots = Vec::new();
    for window in day_windows {
        let window_end = date.and_time(window.end_time);
        let mut local_start = date.and_time(window.start_time);

        while local_start + params.duration <= window_end {
            if let Some(starts_at) = local_to_utc(&params.timezone, local_start) {
                let ends_at = starts_at + params.duration;
                if params.accepts_start(starts_at)
                    && !booked.iter().any(|b| b.overlaps(starts_at, ends_at))
                {
                    slots.push(TimeSlot {
                        starts_at,
                        ends_at,
                        local_time: local_start.time(),
                    });
                }
            }
            local_start += params.interval;
        }
    }

    slots.sort();
    slots.dedup_by_key(|s| s.starts_at);
    slots
}

/// Dates in `[from, to]` with at least one open slot.
pub fn open_days(
    from: NaiveDate,
    to: NaiveDate,
    windows: &[AvailabilityWindow],
    blocked_dates: &HashSet<NaiveDate>,
    booked: &[BookedInterval],
    params: &SlotParams,
) -> Vec<NaiveDate> {
    from.iter_days()
        .take_while(|d| *d <= to)
        .filter(|d| {
            !compute_open_slots(*d, windows, blocked_dates.contains(d), booked, params).is_empty()
        })
        .collect()
}

/// Finds the open slot starting exactly at `starts_at`.
pub fn find_slot(slots: &[TimeSlot], starts_at: DateTime<Utc>) -> Option<&TimeSlot> {
    slots.iter().find(|s| s.starts_at == starts_at)
}
