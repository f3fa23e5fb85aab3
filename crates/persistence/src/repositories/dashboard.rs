//! Dashboard summary repository.

use chrono::{DateTime, Duration, Utc};
use domain::models::dashboard::{BookingCounts, ContactCounts, ContentCounts, DashboardSummary};
use sqlx::{PgPool, Row};

use crate::metrics::QueryTimer;

/// Repository for admin dashboard aggregates.
#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    /// Create a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Aggregate counts for the dashboard landing page.
    pub async fn summary(&self, now: DateTime<Utc>) -> Result<DashboardSummary, sqlx::Error> {
        let (bookings, contacts, content) = tokio::try_join!(
            self.booking_counts(now),
            self.contact_counts(),
            self.content_counts(),
        )?;

        Ok(DashboardSummary {
            bookings,
            contacts,
            content,
            generated_at: now,
        })
    }

    async fn booking_counts(&self, now: DateTime<Utc>) -> Result<BookingCounts, sqlx::Error> {
        let timer = QueryTimer::new("dashboard_booking_counts");
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'pending') AS pending,
                COUNT(*) FILTER (WHERE status = 'confirmed') AS confirmed,
                COUNT(*) FILTER (WHERE status = 'declined') AS declined,
                COUNT(*) FILTER (WHERE status = 'cancelled') AS cancelled,
                COUNT(*) FILTER (WHERE status = 'completed') AS completed,
                COUNT(*) FILTER (
                    WHERE status = 'confirmed' AND starts_at >= $1 AND starts_at < $2
                ) AS upcoming_week,
                COUNT(*) FILTER (WHERE has_unread_reply) AS with_unread_reply
            FROM bookings
            "#,
        )
        .bind(now)
        .bind(now + Duration::days(7))
        .fetch_one(&self.pool)
        .await?;
        timer.record();

        Ok(BookingCounts {
            pending: row.get::<i64, _>("pending"),
            confirmed: row.get::<i64, _>("confirmed"),
            declined: row.get::<i64, _>("declined"),
            cancelled: row.get::<i64, _>("cancelled"),
            completed: row.get::<i64, _>("completed"),
            upcoming_week: row.get::<i64, _>("upcoming_week"),
            with_unread_reply: row.get::<i64, _>("with_unread_reply"),
        })
    }

    async fn contact_counts(&self) -> Result<ContactCounts, sqlx::Error> {
        let timer = QueryTimer::new("dashboard_contact_counts");
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'new') AS new,
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE has_unread_reply) AS with_unread_reply
            FROM contact_submissions
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        timer.record();

        Ok(ContactCounts {
            new: row.get::<i64, _>("new"),
            total: row.get::<i64, _>("total"),
            with_unread_reply: row.get::<i64, _>("with_unread_reply"),
        })
    }

    async fn content_counts(&self) -> Result<ContentCounts, sqlx::Error> {
        let timer = QueryTimer::new("dashboard_content_counts");
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM blog_posts WHERE published) AS published_posts,
                (SELECT COUNT(*) FROM blog_posts WHERE NOT published) AS draft_posts,
                (SELECT COUNT(*) FROM testimonials WHERE approved) AS approved_testimonials,
                (SELECT COUNT(*) FROM testimonials WHERE NOT approved) AS pending_testimonials
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        timer.record();

        Ok(ContentCounts {
            published_posts: row.get::<i64, _>("published_posts"),
            draft_posts: row.get::<i64, _>("draft_posts"),
            approved_testimonials: row.get::<i64, _>("approved_testimonials"),
            pending_testimonials: row.get::<i64, _>("pending_testimonials"),
        })
    }
}
