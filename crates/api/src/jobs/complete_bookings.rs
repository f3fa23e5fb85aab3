//! Marks confirmed sessions that have ended as completed.

use chrono::Utc;
use domain::models::BookingStatus;
use persistence::repositories::BookingRepository;
use sqlx::PgPool;
use tracing::info;

use crate::middleware::metrics::record_booking_status_changed;

use super::scheduler::{Job, JobFrequency};

pub struct CompletePastBookingsJob {
    bookings: BookingRepository,
}

impl CompletePastBookingsJob {
    pub fn new(pool: PgPool) -> Self {
        Self {
            bookings: BookingRepository::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl Job for CompletePastBookingsJob {
    fn name(&self) -> &'static str {
        "complete_past_bookings"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Hourly
    }

    fn run_on_start(&self) -> bool {
        true
    }

    async fn execute(&self) -> Result<(), String> {
        let completed = self
            .bookings
            .complete_past(Utc::now())
            .await
            .map_err(|e| format!("Failed to complete past bookings: {}", e))?;

        for booking in &completed {
            record_booking_status_changed(BookingStatus::Completed.as_str());
            info!(booking_id = %booking.id, reference = %booking.reference, "Booking completed");
        }
        if !completed.is_empty() {
            info!(count = completed.len(), "Past bookings marked completed");
        }
        Ok(())
    }
}
