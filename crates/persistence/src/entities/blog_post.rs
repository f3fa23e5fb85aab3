//! Blog post entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::blog_post::BlogPost;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the blog_posts table.
#[derive(Debug, Clone, FromRow)]
pub struct BlogPostEntity {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image_url: Option<String>,
    pub tags: Vec<String>,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BlogPostEntity> for BlogPost {
    fn from(entity: BlogPostEntity) -> Self {
        Self {
            id: entity.id,
            slug: entity.slug,
            title: entity.title,
            excerpt: entity.excerpt,
            content: entity.content,
            cover_image_url: entity.cover_image_url,
            tags: entity.tags,
            published: entity.published,
            published_at: entity.published_at,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
