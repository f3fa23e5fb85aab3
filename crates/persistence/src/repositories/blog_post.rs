//! Blog post repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::BlogPostEntity;
use crate::metrics::QueryTimer;

/// Input for inserting a blog post.
#[derive(Debug, Clone)]
pub struct NewBlogPost<'a> {
    pub slug: &'a str,
    pub title: &'a str,
    pub excerpt: Option<&'a str>,
    pub content: &'a str,
    pub cover_image_url: Option<&'a str>,
    pub tags: &'a [String],
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
}

/// Partial update. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct BlogPostChanges<'a> {
    pub slug: Option<&'a str>,
    pub title: Option<&'a str>,
    pub excerpt: Option<&'a str>,
    pub content: Option<&'a str>,
    pub cover_image_url: Option<&'a str>,
    pub tags: Option<&'a [String]>,
    pub published: Option<bool>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Repository for blog post database operations.
#[derive(Clone)]
pub struct BlogPostRepository {
    pool: PgPool,
}

impl BlogPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: &NewBlogPost<'_>) -> Result<BlogPostEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_blog_post");
        let result = sqlx::query_as::<_, BlogPostEntity>(
            r#"
            INSERT INTO blog_posts (
                slug, title, excerpt, content, cover_image_url, tags, published, published_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(input.slug)
        .bind(input.title)
        .bind(input.excerpt)
        .bind(input.content)
        .bind(input.cover_image_url)
        .bind(input.tags)
        .bind(input.published)
        .bind(input.published_at)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<BlogPostEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_blog_post_by_id");
        let result = sqlx::query_as::<_, BlogPostEntity>("SELECT * FROM blog_posts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Finds a post by slug; drafts are hidden when `published_only` is set.
    pub async fn find_by_slug(
        &self,
        slug: &str,
        published_only: bool,
    ) -> Result<Option<BlogPostEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_blog_post_by_slug");
        let result = sqlx::query_as::<_, BlogPostEntity>(
            "SELECT * FROM blog_posts WHERE slug = $1 AND (published OR NOT $2)",
        )
        .bind(slug)
        .bind(published_only)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Published posts, newest first, optionally with a tag.
    pub async fn list_published(
        &self,
        tag: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<BlogPostEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_published_blog_posts");
        let result = sqlx::query_as::<_, BlogPostEntity>(
            r#"
            SELECT * FROM blog_posts
            WHERE published AND ($1::text IS NULL OR $1 = ANY(tags))
            ORDER BY published_at DESC NULLS LAST, created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(tag)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn count_published(&self, tag: Option<&str>) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_published_blog_posts");
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM blog_posts WHERE published AND ($1::text IS NULL OR $1 = ANY(tags))",
        )
        .bind(tag)
        .fetch_one(&self.pool)
        .await?;
        timer.record();
        Ok(count.0)
    }

    /// All posts including drafts, most recently edited first.
    pub async fn list_all(&self, limit: i64, offset: i64) -> Result<Vec<BlogPostEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_all_blog_posts");
        let result = sqlx::query_as::<_, BlogPostEntity>(
            "SELECT * FROM blog_posts ORDER BY updated_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn count_all(&self) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_all_blog_posts");
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM blog_posts")
            .fetch_one(&self.pool)
            .await?;
        timer.record();
        Ok(count.0)
    }

    pub async fn update(
        &self,
        id: Uuid,
        changes: &BlogPostChanges<'_>,
    ) -> Result<Option<BlogPostEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_blog_post");
        let result = sqlx::query_as::<_, BlogPostEntity>(
            r#"
            UPDATE blog_posts SET
                slug = COALESCE($2, slug),
                title = COALESCE($3, title),
                excerpt = COALESCE($4, excerpt),
                content = COALESCE($5, content),
                cover_image_url = COALESCE($6, cover_image_url),
                tags = COALESCE($7, tags),
                published = COALESCE($8, published),
                published_at = COALESCE($9, published_at)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.slug)
        .bind(changes.title)
        .bind(changes.excerpt)
        .bind(changes.content)
        .bind(changes.cover_image_url)
        .bind(changes.tags)
        .bind(changes.published)
        .bind(changes.published_at)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_blog_post");
        let result = sqlx::query("DELETE FROM blog_posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }

    /// Whether another post already uses `slug`.
    pub async fn slug_exists(&self, slug: &str, exclude_id: Option<Uuid>) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("blog_post_slug_exists");
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM blog_posts WHERE slug = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(slug)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        timer.record();
        Ok(exists.0)
    }
}
