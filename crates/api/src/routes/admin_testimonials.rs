//! Admin testimonial management.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::testimonial::{CreateTestimonialRequest, UpdateTestimonialRequest};
use domain::models::Testimonial;
use persistence::repositories::{NewTestimonial, TestimonialChanges, TestimonialRepository};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;

fn not_found() -> ApiError {
    ApiError::NotFound("Testimonial not found".to_string())
}

/// All testimonials, including unapproved ones.
///
/// GET /api/v1/admin/testimonials
pub async fn list_testimonials(
    State(state): State<AppState>,
) -> Result<Json<Vec<Testimonial>>, ApiError> {
    let testimonials = TestimonialRepository::new(state.pool.clone())
        .list_all()
        .await?
        .into_iter()
        .map(Testimonial::from)
        .collect();
    Ok(Json(testimonials))
}

/// POST /api/v1/admin/testimonials
pub async fn create_testimonial(
    State(state): State<AppState>,
    Json(request): Json<CreateTestimonialRequest>,
) -> Result<(StatusCode, Json<Testimonial>), ApiError> {
    request.validate()?;

    let testimonial: Testimonial = TestimonialRepository::new(state.pool.clone())
        .create(&NewTestimonial {
            author_name: request.author_name.trim(),
            author_role: request
                .author_role
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty()),
            content: request.content.trim(),
            rating: request.rating,
            approved: request.approved,
            featured: request.featured,
            display_order: request.display_order,
        })
        .await?
        .into();

    tracing::info!(testimonial_id = %testimonial.id, "Testimonial created");
    Ok((StatusCode::CREATED, Json(testimonial)))
}

/// PUT /api/v1/admin/testimonials/:id
pub async fn update_testimonial(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateTestimonialRequest>,
) -> Result<Json<Testimonial>, ApiError> {
    request.validate()?;

    let changes = TestimonialChanges {
        author_name: request.author_name.as_deref().map(str::trim),
        author_role: request.author_role.as_deref().map(str::trim),
        content: request.content.as_deref().map(str::trim),
        rating: request.rating,
        approved: request.approved,
        featured: request.featured,
        display_order: request.display_order,
    };

    let testimonial = TestimonialRepository::new(state.pool.clone())
        .update(id, &changes)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(testimonial.into()))
}

/// DELETE /api/v1/admin/testimonials/:id
pub async fn delete_testimonial(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !TestimonialRepository::new(state.pool.clone()).delete(id).await? {
        return Err(not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}
