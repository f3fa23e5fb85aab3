//! Testimonial repository.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::TestimonialEntity;
use crate::metrics::QueryTimer;

/// Input for inserting a testimonial.
#[derive(Debug, Clone)]
pub struct NewTestimonial<'a> {
    pub author_name: &'a str,
    pub author_role: Option<&'a str>,
    pub content: &'a str,
    pub rating: Option<i16>,
    pub approved: bool,
    pub featured: bool,
    pub display_order: i32,
}

/// Partial update. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct TestimonialChanges<'a> {
    pub author_name: Option<&'a str>,
    pub author_role: Option<&'a str>,
    pub content: Option<&'a str>,
    pub rating: Option<i16>,
    pub approved: Option<bool>,
    pub featured: Option<bool>,
    pub display_order: Option<i32>,
}

/// Repository for testimonial database operations.
#[derive(Clone)]
pub struct TestimonialRepository {
    pool: PgPool,
}

impl TestimonialRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: &NewTestimonial<'_>) -> Result<TestimonialEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_testimonial");
        let result = sqlx::query_as::<_, TestimonialEntity>(
            r#"
            INSERT INTO testimonials (
                author_name, author_role, content, rating, approved, featured, display_order
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(input.author_name)
        .bind(input.author_role)
        .bind(input.content)
        .bind(input.rating)
        .bind(input.approved)
        .bind(input.featured)
        .bind(input.display_order)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<TestimonialEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_testimonial_by_id");
        let result =
            sqlx::query_as::<_, TestimonialEntity>("SELECT * FROM testimonials WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await;
        timer.record();
        result
    }

    /// Approved testimonials: featured first, then by display order.
    pub async fn list_approved(&self) -> Result<Vec<TestimonialEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_approved_testimonials");
        let result = sqlx::query_as::<_, TestimonialEntity>(
            r#"
            SELECT * FROM testimonials
            WHERE approved
            ORDER BY featured DESC, display_order, created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn list_all(&self) -> Result<Vec<TestimonialEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_all_testimonials");
        let result = sqlx::query_as::<_, TestimonialEntity>(
            "SELECT * FROM testimonials ORDER BY approved, featured DESC, display_order, created_at DESC",
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn update(
        &self,
        id: Uuid,
        changes: &TestimonialChanges<'_>,
    ) -> Result<Option<TestimonialEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_testimonial");
        let result = sqlx::query_as::<_, TestimonialEntity>(
            r#"
            UPDATE testimonials SET
                author_name = COALESCE($2, author_name),
                author_role = COALESCE($3, author_role),
                content = COALESCE($4, content),
                rating = COALESCE($5, rating),
                approved = COALESCE($6, approved),
                featured = COALESCE($7, featured),
                display_order = COALESCE($8, display_order)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.author_name)
        .bind(changes.author_role)
        .bind(changes.content)
        .bind(changes.rating)
        .bind(changes.approved)
        .bind(changes.featured)
        .bind(changes.display_order)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_testimonial");
        let result = sqlx::query("DELETE FROM testimonials WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }
}
