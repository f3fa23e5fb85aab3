//! Endpoints for an external scheduler.

use axum::{extract::State, Json};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use shared::crypto::constant_time_eq;

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::inbox_sync::{InboxSyncError, InboxSyncService, InboxSyncSummary};

/// Checks `Authorization: Bearer <cron_secret>`. An empty secret disables
/// the cron endpoints.
fn authorize(secret: &str, provided: Option<&str>) -> Result<(), ApiError> {
    match provided {
        Some(token) if !secret.is_empty() && constant_time_eq(token.as_bytes(), secret.as_bytes()) => {
            Ok(())
        }
        _ => Err(ApiError::Unauthorized("Invalid cron secret".to_string())),
    }
}

/// Run one inbox sync pass.
///
/// POST /api/v1/cron/inbox-poll
pub async fn inbox_poll(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<Json<InboxSyncSummary>, ApiError> {
    authorize(
        &state.config.security.cron_secret,
        auth.as_ref().map(|TypedHeader(header)| header.token()),
    )?;

    if !state.config.inbox.enabled {
        return Err(ApiError::ServiceUnavailable("Inbox polling is disabled".into()));
    }

    let summary = InboxSyncService::new(state.pool.clone(), &state.config, state.graph.clone())
        .run_once()
        .await
        .map_err(|e| match e {
            InboxSyncError::NotConfigured => {
                ApiError::ServiceUnavailable("Mailbox access is not configured".into())
            }
            InboxSyncError::Graph(e) => {
                tracing::error!(error = %e, "Inbox sync failed");
                ApiError::ServiceUnavailable("Mailbox is unavailable".into())
            }
        })?;

    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize() {
        assert!(authorize("s3cret", Some("s3cret")).is_ok());
        assert!(authorize("s3cret", Some("wrong")).is_err());
        assert!(authorize("s3cret", None).is_err());
    }

    #[test]
    fn test_empty_secret_disables_endpoint() {
        assert!(authorize("", Some("")).is_err());
    }
}
