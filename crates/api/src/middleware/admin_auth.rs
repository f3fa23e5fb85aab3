//! Admin JWT authentication middleware.
//!
//! Every `/api/v1/admin` route and the authenticated `/auth` routes run behind
//! [`require_admin`].

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use persistence::repositories::UserRepository;
use serde_json::json;
use shared::jwt::{extract_user_id, JwtConfig};
use uuid::Uuid;

use crate::app::AppState;

/// Authenticated admin, inserted into request extensions.
#[derive(Debug, Clone)]
pub struct AdminAuth {
    pub user_id: Uuid,
    pub jti: String,
    pub email: String,
}

/// Pulls the token out of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(value: Option<&str>) -> Option<&str> {
    value
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Validates the access token and returns `(user_id, jti)`.
pub fn validate_access(jwt_config: &JwtConfig, token: &str) -> Result<(Uuid, String), String> {
    let claims = jwt_config
        .validate_access_token(token)
        .map_err(|e| format!("Invalid token: {}", e))?;
    let user_id = extract_user_id(&claims).map_err(|e| e.to_string())?;
    Ok((user_id, claims.jti))
}

/// Middleware that requires a valid admin access token for an active user.
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let Some(token) = bearer_token(header_value) else {
        return unauthorized_response("Missing or invalid Authorization header");
    };

    let (user_id, jti) = match validate_access(&state.jwt, token) {
        Ok(ids) => ids,
        Err(e) => {
            tracing::debug!("JWT validation failed: {}", e);
            return unauthorized_response("Invalid or expired token");
        }
    };

    let user = match UserRepository::new(state.pool.clone()).find_by_id(user_id).await {
        Ok(Some(user)) if user.is_active => user,
        Ok(_) => {
            tracing::warn!(user_id = %user_id, "Token for missing or disabled user");
            return unauthorized_response("Invalid or expired token");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to load admin user");
            return internal_error_response("Authentication service unavailable");
        }
    };

    req.extensions_mut().insert(AdminAuth {
        user_id,
        jti,
        email: user.email,
    });
    next.run(req).await
}

fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "unauthorized",
            "message": message
        })),
    )
        .into_response()
}

fn internal_error_response(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "internal_error",
            "message": message
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt() -> JwtConfig {
        JwtConfig::from_secret("test-jwt-secret-that-is-at-least-32-bytes", 900, 3600, 0)
            .unwrap()
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(Some("Basic abc")), None);
        assert_eq!(bearer_token(Some("Bearer ")), None);
        assert_eq!(bearer_token(None), None);
    }

    #[test]
    fn test_validate_access_round_trip() {
        let config = jwt();
        let user_id = Uuid::new_v4();
        let (token, jti) = config.generate_access_token(user_id).unwrap();
        let (parsed, parsed_jti) = validate_access(&config, &token).unwrap();
        assert_eq!(parsed, user_id);
        assert_eq!(parsed_jti, jti);
    }

    #[test]
    fn test_refresh_token_rejected_as_access() {
        let config = jwt();
        let (refresh, _) = config.generate_refresh_token(Uuid::new_v4()).unwrap();
        assert!(validate_access(&config, &refresh).is_err());
    }

    #[test]
    fn test_unauthorized_response_status() {
        assert_eq!(
            unauthorized_response("nope").status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
