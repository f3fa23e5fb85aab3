//! Public testimonials.

use axum::{extract::State, Json};
use domain::models::testimonial::PublicTestimonial;
use domain::models::Testimonial;
use persistence::repositories::TestimonialRepository;

use crate::app::AppState;
use crate::error::ApiError;

/// Approved testimonials, featured first.
///
/// GET /api/v1/testimonials
pub async fn list_testimonials(
    State(state): State<AppState>,
) -> Result<Json<Vec<PublicTestimonial>>, ApiError> {
    let testimonials = TestimonialRepository::new(state.pool.clone())
        .list_approved()
        .await?
        .into_iter()
        .map(|e| PublicTestimonial::from(Testimonial::from(e)))
        .collect();
    Ok(Json(testimonials))
}
