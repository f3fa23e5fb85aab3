//! Availability windows and blocked dates.

use chrono::{NaiveDate, NaiveTime};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::entities::{AvailabilityWindowEntity, BlockedDateEntity};
use crate::metrics::QueryTimer;

/// One window of the weekly template to insert.
#[derive(Debug, Clone, Copy)]
pub struct WindowInput {
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_active: bool,
}

/// Repository for the weekly availability template.
#[derive(Clone)]
pub struct AvailabilityRepository {
    pool: PgPool,
}

impl AvailabilityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All windows ordered by weekday and start time.
    pub async fn list_windows(&self) -> Result<Vec<AvailabilityWindowEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_availability_windows");
        let result = sqlx::query_as::<_, AvailabilityWindowEntity>(
            "SELECT * FROM availability_windows ORDER BY day_of_week, start_time",
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn list_active_for_weekday(
        &self,
        day_of_week: i16,
    ) -> Result<Vec<AvailabilityWindowEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_active_windows_for_weekday");
        let result = sqlx::query_as::<_, AvailabilityWindowEntity>(
            r#"
            SELECT * FROM availability_windows
            WHERE day_of_week = $1 AND is_active
            ORDER BY start_time
            "#,
        )
        .bind(day_of_week)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<AvailabilityWindowEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_availability_window");
        let result = sqlx::query_as::<_, AvailabilityWindowEntity>(
            "SELECT * FROM availability_windows WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn create(&self, input: WindowInput) -> Result<AvailabilityWindowEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_availability_window");
        let result = sqlx::query_as::<_, AvailabilityWindowEntity>(
            r#"
            INSERT INTO availability_windows (day_of_week, start_time, end_time, is_active)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(input.day_of_week)
        .bind(input.start_time)
        .bind(input.end_time)
        .bind(input.is_active)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Overwrites a window with already merged values.
    pub async fn update(
        &self,
        id: Uuid,
        input: WindowInput,
    ) -> Result<Option<AvailabilityWindowEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_availability_window");
        let result = sqlx::query_as::<_, AvailabilityWindowEntity>(
            r#"
            UPDATE availability_windows SET
                day_of_week = $2,
                start_time = $3,
                end_time = $4,
                is_active = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.day_of_week)
        .bind(input.start_time)
        .bind(input.end_time)
        .bind(input.is_active)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_availability_window");
        let result = sqlx::query("DELETE FROM availability_windows WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }

    /// Replaces the whole weekly template in one transaction.
    pub async fn replace_all(
        &self,
        windows: &[WindowInput],
    ) -> Result<Vec<AvailabilityWindowEntity>, sqlx::Error> {
        let timer = QueryTimer::new("replace_availability_windows");
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM availability_windows")
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let mut created = Vec::with_capacity(windows.len());
        for w in windows {
            let row = sqlx::query_as::<_, AvailabilityWindowEntity>(
                r#"
                INSERT INTO availability_windows (day_of_week, start_time, end_time, is_active)
                VALUES ($1, $2, $3, $4)
                RETURNING *
                "#,
            )
            .bind(w.day_of_week)
            .bind(w.start_time)
            .bind(w.end_time)
            .bind(w.is_active)
            .fetch_one(&mut *tx)
            .await?;
            created.push(row);
        }

        tx.commit().await?;
        timer.record();

        info!(removed = removed, created = created.len(), "Replaced availability template");
        created.sort_by_key(|w| (w.day_of_week, w.start_time));
        Ok(created)
    }
}

/// Repository for blocked dates.
#[derive(Clone)]
pub struct BlockedDateRepository {
    pool: PgPool,
}

impl BlockedDateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Blocked dates in `[from, to]`; open ends are unbounded.
    pub async fn list(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<BlockedDateEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_blocked_dates");
        let result = sqlx::query_as::<_, BlockedDateEntity>(
            r#"
            SELECT * FROM blocked_dates
            WHERE ($1::date IS NULL OR date >= $1)
              AND ($2::date IS NULL OR date <= $2)
            ORDER BY date
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn is_blocked(&self, date: NaiveDate) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("is_date_blocked");
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM blocked_dates WHERE date = $1)")
                .bind(date)
                .fetch_one(&self.pool)
                .await?;
        timer.record();
        Ok(exists.0)
    }

    /// Fails with a unique violation if the date is already blocked.
    pub async fn create(
        &self,
        date: NaiveDate,
        reason: Option<&str>,
    ) -> Result<BlockedDateEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_blocked_date");
        let result = sqlx::query_as::<_, BlockedDateEntity>(
            "INSERT INTO blocked_dates (date, reason) VALUES ($1, $2) RETURNING *",
        )
        .bind(date)
        .bind(reason)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_blocked_date");
        let result = sqlx::query("DELETE FROM blocked_dates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }
}
