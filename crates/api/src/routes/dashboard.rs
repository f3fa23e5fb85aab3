//! Admin dashboard.

use axum::{extract::State, Json};
use chrono::Utc;
use domain::models::DashboardSummary;
use persistence::repositories::DashboardRepository;

use crate::app::AppState;
use crate::error::ApiError;

/// Counts for the admin landing page.
///
/// GET /api/v1/admin/dashboard
pub async fn get_dashboard(
    State(state): State<AppState>,
) -> Result<Json<DashboardSummary>, ApiError> {
    let summary = DashboardRepository::new(state.pool.clone())
        .summary(Utc::now())
        .await?;
    Ok(Json(summary))
}
