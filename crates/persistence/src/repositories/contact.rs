//! Contact submission repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{ContactStatusDb, ContactSubmissionEntity};
use crate::metrics::QueryTimer;
use crate::repositories::booking::escape_like;

/// Input for inserting a contact submission.
#[derive(Debug, Clone)]
pub struct NewContactSubmission<'a> {
    pub reference: &'a str,
    pub name: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub subject: &'a str,
    pub message: &'a str,
}

/// Repository for contact submission database operations.
#[derive(Clone)]
pub struct ContactRepository {
    pool: PgPool,
}

impl ContactRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        input: &NewContactSubmission<'_>,
    ) -> Result<ContactSubmissionEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_contact_submission");
        let result = sqlx::query_as::<_, ContactSubmissionEntity>(
            r#"
            INSERT INTO contact_submissions (reference, name, email, phone, subject, message)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(input.reference)
        .bind(input.name)
        .bind(input.email)
        .bind(input.phone)
        .bind(input.subject)
        .bind(input.message)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ContactSubmissionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_contact_by_id");
        let result = sqlx::query_as::<_, ContactSubmissionEntity>(
            "SELECT * FROM contact_submissions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<ContactSubmissionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_contact_by_reference");
        let result = sqlx::query_as::<_, ContactSubmissionEntity>(
            "SELECT * FROM contact_submissions WHERE reference = $1",
        )
        .bind(reference.to_ascii_uppercase())
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Lists submissions, newest first.
    pub async fn list(
        &self,
        status: Option<ContactStatusDb>,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ContactSubmissionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_contact_submissions");
        let result = sqlx::query_as::<_, ContactSubmissionEntity>(
            r#"
            SELECT * FROM contact_submissions
            WHERE ($1::contact_status IS NULL OR status = $1)
              AND ($2::text IS NULL OR name ILIKE $2 OR email ILIKE $2 OR subject ILIKE $2 OR reference ILIKE $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(status)
        .bind(search_pattern(search))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn count(
        &self,
        status: Option<ContactStatusDb>,
        search: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_contact_submissions");
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM contact_submissions
            WHERE ($1::contact_status IS NULL OR status = $1)
              AND ($2::text IS NULL OR name ILIKE $2 OR email ILIKE $2 OR subject ILIKE $2 OR reference ILIKE $2)
            "#,
        )
        .bind(status)
        .bind(search_pattern(search))
        .fetch_one(&self.pool)
        .await?;
        timer.record();
        Ok(count.0)
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        status: ContactStatusDb,
    ) -> Result<Option<ContactSubmissionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_contact_status");
        let result = sqlx::query_as::<_, ContactSubmissionEntity>(
            "UPDATE contact_submissions SET status = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Marks a NEW submission as READ and clears its unread flag.
    pub async fn mark_viewed(&self, id: Uuid) -> Result<Option<ContactSubmissionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("mark_contact_viewed");
        let result = sqlx::query_as::<_, ContactSubmissionEntity>(
            r#"
            UPDATE contact_submissions SET
                status = CASE WHEN status = 'new' THEN 'read'::contact_status ELSE status END,
                has_unread_reply = FALSE
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn set_unread_reply(&self, id: Uuid, unread: bool) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("set_contact_unread_reply");
        let result = sqlx::query(
            "UPDATE contact_submissions SET has_unread_reply = $2 WHERE id = $1 AND has_unread_reply <> $2",
        )
        .bind(id)
        .bind(unread)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|_| ())
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_contact_submission");
        let result = sqlx::query("DELETE FROM contact_submissions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }

    /// Most recent non-archived submission from this address since `since`.
    pub async fn find_recent_by_email(
        &self,
        email: &str,
        since: DateTime<Utc>,
    ) -> Result<Option<ContactSubmissionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_recent_contact_by_email");
        let result = sqlx::query_as::<_, ContactSubmissionEntity>(
            r#"
            SELECT * FROM contact_submissions
            WHERE LOWER(email) = LOWER($1)
              AND created_at >= $2
              AND status <> 'archived'
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
}

fn search_pattern(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", escape_like(s)))
}
