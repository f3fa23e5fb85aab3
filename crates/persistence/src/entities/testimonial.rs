//! Testimonial entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::testimonial::Testimonial;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the testimonials table.
#[derive(Debug, Clone, FromRow)]
pub struct TestimonialEntity {
    pub id: Uuid,
    pub author_name: String,
    pub author_role: Option<String>,
    pub content: String,
    pub rating: Option<i16>,
    pub approved: bool,
    pub featured: bool,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TestimonialEntity> for Testimonial {
    fn from(entity: TestimonialEntity) -> Self {
        Self {
            id: entity.id,
            author_name: entity.author_name,
            author_role: entity.author_role,
            content: entity.content,
            rating: entity.rating,
            approved: entity.approved,
            featured: entity.featured,
            display_order: entity.display_order,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
