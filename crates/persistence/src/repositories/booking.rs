//! Booking repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{BookingEntity, BookingStatusDb};
use crate::metrics::QueryTimer;

/// Exclusion constraint that keeps live bookings from overlapping.
pub const BOOKING_OVERLAP_CONSTRAINT: &str = "bookings_no_overlap";

/// Unique constraint on the public booking reference.
pub const BOOKING_REFERENCE_CONSTRAINT: &str = "bookings_reference_key";

/// True when `err` was raised by the named table constraint.
pub fn violates_constraint(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.constraint() == Some(constraint),
        _ => false,
    }
}

/// Input for inserting a new booking.
#[derive(Debug, Clone)]
pub struct NewBooking<'a> {
    pub reference: &'a str,
    pub client_name: &'a str,
    pub client_email: &'a str,
    pub client_phone: Option<&'a str>,
    pub session_type: &'a str,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub message: Option<&'a str>,
    pub manage_token_hash: &'a str,
}

/// Filters for the admin booking list. `None` means no restriction.
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub status: Option<BookingStatusDb>,
    pub starts_from: Option<DateTime<Utc>>,
    pub starts_before: Option<DateTime<Utc>>,
    /// Matched against name, email and reference.
    pub search: Option<String>,
}

impl BookingFilter {
    fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(s)))
    }
}

/// Escapes `%`, `_` and `\` for use inside an ILIKE pattern.
pub(crate) fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

const FILTER_CLAUSE: &str = r#"
    ($1::booking_status IS NULL OR status = $1)
    AND ($2::timestamptz IS NULL OR starts_at >= $2)
    AND ($3::timestamptz IS NULL OR starts_at < $3)
    AND ($4::text IS NULL
         OR client_name ILIKE $4
         OR client_email ILIKE $4
         OR reference ILIKE $4)
"#;

/// Repository for booking database operations.
#[derive(Clone)]
pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    /// Creates a new BookingRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a PENDING booking.
    ///
    /// Fails on [`BOOKING_OVERLAP_CONSTRAINT`] when another live booking
    /// overlaps the interval, and on [`BOOKING_REFERENCE_CONSTRAINT`] when the
    /// reference collides.
    pub async fn create(&self, input: &NewBooking<'_>) -> Result<BookingEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_booking");
        let result = sqlx::query_as::<_, BookingEntity>(
            r#"
            INSERT INTO bookings (
                reference, client_name, client_email, client_phone, session_type,
                starts_at, ends_at, message, manage_token_hash
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(input.reference)
        .bind(input.client_name)
        .bind(input.client_email)
        .bind(input.client_phone)
        .bind(input.session_type)
        .bind(input.starts_at)
        .bind(input.ends_at)
        .bind(input.message)
        .bind(input.manage_token_hash)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<BookingEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_booking_by_id");
        let result = sqlx::query_as::<_, BookingEntity>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<BookingEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_booking_by_reference");
        let result =
            sqlx::query_as::<_, BookingEntity>("SELECT * FROM bookings WHERE reference = $1")
                .bind(reference.to_ascii_uppercase())
                .fetch_optional(&self.pool)
                .await;
        timer.record();
        result
    }

    /// Lists bookings, upcoming first.
    pub async fn list(
        &self,
        filter: &BookingFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<BookingEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_bookings");
        let query = format!(
            "SELECT * FROM bookings WHERE {} ORDER BY starts_at DESC LIMIT $5 OFFSET $6",
            FILTER_CLAUSE
        );
        let result = sqlx::query_as::<_, BookingEntity>(&query)
            .bind(filter.status)
            .bind(filter.starts_from)
            .bind(filter.starts_before)
            .bind(filter.search_pattern())
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn count(&self, filter: &BookingFilter) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_bookings");
        let query = format!("SELECT COUNT(*) FROM bookings WHERE {}", FILTER_CLAUSE);
        let count: (i64,) = sqlx::query_as(&query)
            .bind(filter.status)
            .bind(filter.starts_from)
            .bind(filter.starts_before)
            .bind(filter.search_pattern())
            .fetch_one(&self.pool)
            .await?;
        timer.record();
        Ok(count.0)
    }

    /// PENDING and CONFIRMED bookings overlapping `[from, to)`.
    pub async fn find_blocking_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<BookingEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_blocking_bookings");
        let result = sqlx::query_as::<_, BookingEntity>(
            r#"
            SELECT * FROM bookings
            WHERE status IN ('pending', 'confirmed')
              AND starts_at < $2
              AND ends_at > $1
            ORDER BY starts_at
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Moves a booking from `from` to `to`.
    ///
    /// Returns `None` when the booking does not exist or its status is no
    /// longer `from` (a concurrent change won).
    pub async fn update_status(
        &self,
        id: Uuid,
        from: BookingStatusDb,
        to: BookingStatusDb,
        decline_reason: Option<&str>,
    ) -> Result<Option<BookingEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_booking_status");
        let result = sqlx::query_as::<_, BookingEntity>(
            r#"
            UPDATE bookings SET
                status = $3,
                decline_reason = COALESCE($4, decline_reason)
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(decline_reason)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn set_calendar_event_id(
        &self,
        id: Uuid,
        calendar_event_id: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("set_booking_calendar_event");
        let result = sqlx::query("UPDATE bookings SET calendar_event_id = $2 WHERE id = $1")
            .bind(id)
            .bind(calendar_event_id)
            .execute(&self.pool)
            .await;
        timer.record();
        result.map(|_| ())
    }

    pub async fn update_admin_notes(
        &self,
        id: Uuid,
        admin_notes: Option<&str>,
    ) -> Result<Option<BookingEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_booking_notes");
        let result = sqlx::query_as::<_, BookingEntity>(
            "UPDATE bookings SET admin_notes = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(admin_notes)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn set_unread_reply(&self, id: Uuid, unread: bool) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("set_booking_unread_reply");
        let result = sqlx::query(
            "UPDATE bookings SET has_unread_reply = $2 WHERE id = $1 AND has_unread_reply <> $2",
        )
        .bind(id)
        .bind(unread)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|_| ())
    }

    /// Deletes a booking and its conversation. Returns false if not found.
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_booking");
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }

    /// Most recent booking by this client, in any status, that was created
    /// after `since` or has not yet ended. Used to attach untagged replies,
    /// which may also concern declined or cancelled requests.
    pub async fn find_recent_by_email(
        &self,
        email: &str,
        since: DateTime<Utc>,
    ) -> Result<Option<BookingEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_recent_booking_by_email");
        let result = sqlx::query_as::<_, BookingEntity>(
            r#"
            SELECT * FROM bookings
            WHERE LOWER(client_email) = LOWER($1)
              AND (created_at >= $2 OR ends_at >= NOW())
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(email.trim())
        .bind(since)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Marks CONFIRMED bookings whose session ended before `now` as COMPLETED.
    pub async fn complete_past(&self, now: DateTime<Utc>) -> Result<Vec<BookingEntity>, sqlx::Error> {
        let timer = QueryTimer::new("complete_past_bookings");
        let result = sqlx::query_as::<_, BookingEntity>(
            r#"
            UPDATE bookings SET status = 'completed'
            WHERE status = 'confirmed' AND ends_at <= $1
            RETURNING *
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
