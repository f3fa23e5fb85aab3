//! Testimonial domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::validation::{validate_no_html, validate_not_blank};
use uuid::Uuid;
use validator::Validate;

/// A client testimonial shown on the website once approved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Testimonial {
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

/// Public view of a testimonial.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PublicTestimonial {
    pub id: Uuid,
    pub author_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_role: Option<String>,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<i16>,
    pub featured: bool,
}

impl From<Testimonial> for PublicTestimonial {
    fn from(t: Testimonial) -> Self {
        Self {
            id: t.id,
            author_name: t.author_name,
            author_role: t.author_role,
            content: t.content,
            rating: t.rating,
            featured: t.featured,
        }
    }
}

/// Request payload for creating a testimonial.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTestimonialRequest {
    #[validate(
        length(min = 1, max = 120, message = "Author name must be 1-120 characters"),
        custom(function = "validate_not_blank"),
        custom(function = "validate_no_html")
    )]
    pub author_name: String,

    #[validate(length(max = 120, message = "Author role must be at most 120 characters"))]
    pub author_role: Option<String>,

    #[validate(length(min = 1, max = 3000, message = "Content must be 1-3000 characters"))]
    pub content: String,

    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: Option<i16>,

    #[serde(default)]
    pub approved: bool,

    #[serde(default)]
    pub featured: bool,

    #[serde(default)]
    pub display_order: i32,
}

/// Partial update of a testimonial.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTestimonialRequest {
    #[validate(
        length(min = 1, max = 120, message = "Author name must be 1-120 characters"),
        custom(function = "validate_not_blank"),
        custom(function = "validate_no_html")
    )]
    pub author_name: Option<String>,

    #[validate(length(max = 120, message = "Author role must be at most 120 characters"))]
    pub author_role: Option<String>,

    #[validate(length(min = 1, max = 3000, message = "Content must be 1-3000 characters"))]
    pub content: Option<String>,

    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: Option<i16>,

    pub approved: Option<bool>,
    pub featured: Option<bool>,
    pub display_order: Option<i32>,
}
