//! Loads the weekly template, blocked dates and live bookings and feeds them
//! to the slot computation.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use domain::models::availability::weekday_index;
use domain::models::{AvailabilityWindow, SessionType, TimeSlot};
use domain::services::availability::{compute_open_slots, open_days, BookedInterval, SlotParams};
use persistence::repositories::{AvailabilityRepository, BlockedDateRepository, BookingRepository};
use sqlx::PgPool;
use std::collections::HashSet;

use crate::config::PracticeConfig;

/// Longest range `open_days` will scan in one request.
pub const MAX_DAYS_RANGE: i64 = 62;

pub struct AvailabilityService<'a> {
    windows: AvailabilityRepository,
    blocked: BlockedDateRepository,
    bookings: BookingRepository,
    practice: &'a PracticeConfig,
}

impl<'a> AvailabilityService<'a> {
    pub fn new(pool: PgPool, practice: &'a PracticeConfig) -> Self {
        Self {
            windows: AvailabilityRepository::new(pool.clone()),
            blocked: BlockedDateRepository::new(pool.clone()),
            bookings: BookingRepository::new(pool),
            practice,
        }
    }

    pub fn slot_params(&self, session: &SessionType, now: DateTime<Utc>) -> SlotParams {
        SlotParams::new(
            session.duration_minutes,
            self.practice.slot_interval_minutes,
            self.practice.tz(),
            now,
            self.practice.min_notice_hours,
            Some(self.practice.booking_horizon_days),
        )
    }

    /// Open slots for one practice-local date.
    pub async fn slots_for_date(
        &self,
        date: NaiveDate,
        session: &SessionType,
        now: DateTime<Utc>,
    ) -> Result<Vec<TimeSlot>, sqlx::Error> {
        let windows: Vec<AvailabilityWindow> = self
            .windows
            .list_active_for_weekday(weekday_index(date))
            .await?
            .into_iter()
            .map(AvailabilityWindow::from)
            .collect();
        let blocked = self.blocked.is_blocked(date).await?;
        let booked = self.booked_between(date, date).await?;
        Ok(compute_open_slots(
            date,
            &windows,
            blocked,
            &booked,
            &self.slot_params(session, now),
        ))
    }

    /// Dates in `[from, to]` with at least one open slot.
    pub async fn open_days(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        session: &SessionType,
        now: DateTime<Utc>,
    ) -> Result<Vec<NaiveDate>, sqlx::Error> {
        let windows = self.active_windows().await?;
        let blocked: HashSet<NaiveDate> = self
            .blocked
            .list(Some(from), Some(to))
            .await?
            .into_iter()
            .map(|b| b.date)
            .collect();
        let booked = self.booked_between(from, to).await?;
        Ok(open_days(
            from,
            to,
            &windows,
            &blocked,
            &booked,
            &self.slot_params(session, now),
        ))
    }

    async fn active_windows(&self) -> Result<Vec<AvailabilityWindow>, sqlx::Error> {
        Ok(self
            .windows
            .list_windows()
            .await?
            .into_iter()
            .map(AvailabilityWindow::from)
            .filter(|w| w.is_active)
            .collect())
    }

    /// Live bookings that could touch any local date in `[from, to]`.
    ///
    /// The UTC range is padded by a day on each side so every timezone offset
    /// is covered.
    async fn booked_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<BookedInterval>, sqlx::Error> {
        let start = (from - Duration::days(1)).and_time(NaiveTime::MIN).and_utc();
        let end = (to + Duration::days(2)).and_time(NaiveTime::MIN).and_utc();
        Ok(self
            .bookings
            .find_blocking_between(start, end)
            .await?
            .into_iter()
            .map(|b| BookedInterval {
                starts_at: b.starts_at,
                ends_at: b.ends_at,
            })
            .collect())
    }
}
