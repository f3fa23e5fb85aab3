//! Authenticated admin extractor.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;
pub use crate::middleware::admin_auth::AdminAuth;

/// Reads the [`AdminAuth`] inserted by `require_admin`.
///
/// Handlers outside the admin router reject with 401 instead of panicking.
#[async_trait]
impl<S> FromRequestParts<S> for AdminAuth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AdminAuth>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))
    }
}
