//! Authentication routes for admin login and token management.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::user::{
    ChangePasswordRequest, LoginRequest, LoginResponse, RefreshRequest, TokensResponse,
    UserResponse,
};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AdminAuth;
use crate::services::auth::{AuthError, AuthService};

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(state.pool.clone(), (*state.jwt).clone())
}

/// Maps service errors to responses without revealing which check failed.
fn map_auth_error(e: AuthError) -> ApiError {
    match e {
        AuthError::InvalidCredentials | AuthError::UserNotFound | AuthError::UserDisabled => {
            ApiError::Unauthorized("Invalid email or password".to_string())
        }
        AuthError::InvalidRefreshToken => {
            ApiError::Unauthorized("Invalid or expired refresh token".to_string())
        }
        AuthError::WeakPassword(msg) => ApiError::Validation(msg),
        AuthError::DatabaseError(db_err) => ApiError::from(db_err),
        AuthError::PasswordError(e) => ApiError::Internal(format!("Password error: {}", e)),
        AuthError::TokenError(e) => ApiError::Internal(format!("Token error: {}", e)),
    }
}

/// Login with email and password.
///
/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    request.validate()?;

    let result = auth_service(&state)
        .login(&request.email, &request.password)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(LoginResponse {
        user: UserResponse::from(&result.user),
        tokens: result.tokens,
    }))
}

/// Exchange a refresh token for a new token pair.
///
/// POST /api/v1/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<TokensResponse>, ApiError> {
    request.validate()?;

    let tokens = auth_service(&state)
        .refresh(&request.refresh_token)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(tokens))
}

/// Revoke the session behind a refresh token.
///
/// POST /api/v1/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<StatusCode, ApiError> {
    request.validate()?;

    auth_service(&state)
        .logout(&request.refresh_token)
        .await
        .map_err(map_auth_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Current admin.
///
/// GET /api/v1/auth/me
pub async fn me(
    State(state): State<AppState>,
    auth: AdminAuth,
) -> Result<Json<UserResponse>, ApiError> {
    let user = auth_service(&state)
        .me(auth.user_id)
        .await
        .map_err(map_auth_error)?;
    Ok(Json(UserResponse::from(&user)))
}

/// Change the current admin's password. Signs out every session.
///
/// PUT /api/v1/auth/password
pub async fn change_password(
    State(state): State<AppState>,
    auth: AdminAuth,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    request.validate()?;

    auth_service(&state)
        .change_password(auth.user_id, &request.current_password, &request.new_password)
        .await
        .map_err(|e| match e {
            AuthError::InvalidCredentials => {
                ApiError::Validation("Current password is incorrect".to_string())
            }
            other => map_auth_error(other),
        })?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_errors_are_indistinguishable() {
        let messages: Vec<String> = [
            AuthError::InvalidCredentials,
            AuthError::UserNotFound,
            AuthError::UserDisabled,
        ]
        .into_iter()
        .map(|e| map_auth_error(e).to_string())
        .collect();
        assert!(messages.iter().all(|m| m == &messages[0]));
    }

    #[test]
    fn test_weak_password_is_validation_error() {
        assert!(matches!(
            map_auth_error(AuthError::WeakPassword("too short".into())),
            ApiError::Validation(msg) if msg == "too short"
        ));
    }
}
