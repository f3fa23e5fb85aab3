//! Authentication service for admin login, token rotation and password changes.

use chrono::{Duration, Utc};
use domain::models::user::{TokensResponse, UserSession};
use domain::models::User;
use persistence::repositories::UserRepository;
use shared::crypto::sha256_hex;
use shared::jwt::{extract_user_id, JwtConfig, JwtError};
use shared::password::{check_password_strength, hash_password, verify_password, PasswordError};
use shared::validation::normalize_email;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("User is disabled")]
    UserDisabled,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Password does not meet requirements: {0}")]
    WeakPassword(String),

    #[error("Token error: {0}")]
    TokenError(#[from] JwtError),

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub user: User,
    pub tokens: TokensResponse,
}

/// Token pair with the refresh token's jti.
struct TokenPair {
    access_token: String,
    refresh_token: String,
    refresh_token_jti: String,
}

/// Authentication service.
pub struct AuthService {
    users: UserRepository,
    jwt_config: JwtConfig,
}

impl AuthService {
    pub fn new(pool: PgPool, jwt_config: JwtConfig) -> Self {
        Self {
            users: UserRepository::new(pool),
            jwt_config,
        }
    }

    /// Verifies credentials and opens a new session.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResult, AuthError> {
        let user: User = self
            .users
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(AuthError::InvalidCredentials)?
            .into();

        if !verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_active {
            return Err(AuthError::UserDisabled);
        }

        let now = Utc::now();
        self.users.touch_last_login(user.id, now).await?;

        let tokens = self.generate_tokens(user.id)?;
        self.users
            .create_session(
                user.id,
                &sha256_hex(&tokens.refresh_token_jti),
                now + Duration::seconds(self.jwt_config.refresh_token_expiry_secs),
            )
            .await?;

        tracing::info!(user_id = %user.id, "Admin logged in");

        let user = User {
            last_login_at: Some(now),
            ..user
        };
        Ok(AuthResult {
            user,
            tokens: self.tokens_response(tokens),
        })
    }

    /// Exchanges a refresh token for a new token pair.
    ///
    /// The old session is revoked; presenting the same refresh token twice fails.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokensResponse, AuthError> {
        let claims = self
            .jwt_config
            .validate_refresh_token(refresh_token)
            .map_err(map_refresh_error)?;
        let user_id = extract_user_id(&claims).map_err(|_| AuthError::InvalidRefreshToken)?;

        let session: UserSession = self
            .users
            .find_session_by_refresh_hash(&sha256_hex(&claims.jti))
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?
            .into();

        let now = Utc::now();
        if session.user_id != user_id || !session.is_usable(now) {
            return Err(AuthError::InvalidRefreshToken);
        }

        self.ensure_active(user_id).await?;

        let tokens = self.generate_tokens(user_id)?;
        let rotated = self
            .users
            .rotate_session(
                session.id,
                user_id,
                &sha256_hex(&tokens.refresh_token_jti),
                now + Duration::seconds(self.jwt_config.refresh_token_expiry_secs),
            )
            .await?;

        if rotated.is_none() {
            tracing::warn!(user_id = %user_id, session_id = %session.id, "Refresh token reused");
            return Err(AuthError::InvalidRefreshToken);
        }

        Ok(self.tokens_response(tokens))
    }

    /// Revokes the session behind a refresh token. Unknown sessions are not an error.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let claims = self
            .jwt_config
            .validate_refresh_token(refresh_token)
            .map_err(map_refresh_error)?;

        match self
            .users
            .find_session_by_refresh_hash(&sha256_hex(&claims.jti))
            .await?
        {
            Some(session) => {
                self.users.revoke_session(session.id).await?;
                tracing::info!(user_id = %session.user_id, "Admin logged out");
            }
            None => {
                tracing::debug!("Session not found during logout, may already be logged out");
            }
        }

        Ok(())
    }

    /// Loads the active user behind an access token.
    pub async fn me(&self, user_id: Uuid) -> Result<User, AuthError> {
        self.ensure_active(user_id).await
    }

    /// Changes the password and revokes every open session.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let user = self.ensure_active(user_id).await?;

        if !verify_password(current_password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }
        check_password_strength(new_password).map_err(AuthError::WeakPassword)?;

        let hash = hash_password(new_password)?;
        self.users.update_password(user_id, &hash).await?;
        let revoked = self.users.revoke_all_sessions(user_id).await?;

        tracing::info!(user_id = %user_id, revoked_sessions = revoked, "Password changed");
        Ok(())
    }

    async fn ensure_active(&self, user_id: Uuid) -> Result<User, AuthError> {
        let user: User = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?
            .into();
        if !user.is_active {
            return Err(AuthError::UserDisabled);
        }
        Ok(user)
    }

    fn generate_tokens(&self, user_id: Uuid) -> Result<TokenPair, AuthError> {
        let (access_token, _) = self.jwt_config.generate_access_token(user_id)?;
        let (refresh_token, refresh_token_jti) = self.jwt_config.generate_refresh_token(user_id)?;
        Ok(TokenPair {
            access_token,
            refresh_token,
            refresh_token_jti,
        })
    }

    fn tokens_response(&self, tokens: TokenPair) -> TokensResponse {
        TokensResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_config.access_token_expiry_secs,
        }
    }
}

fn map_refresh_error(err: JwtError) -> AuthError {
    match err {
        JwtError::TokenExpired | JwtError::InvalidToken | JwtError::DecodingError(_) => {
            AuthError::InvalidRefreshToken
        }
        other => AuthError::TokenError(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_errors_are_uniform() {
        assert!(matches!(
            map_refresh_error(JwtError::TokenExpired),
            AuthError::InvalidRefreshToken
        ));
        assert!(matches!(
            map_refresh_error(JwtError::InvalidToken),
            AuthError::InvalidRefreshToken
        ));
        assert!(matches!(
            map_refresh_error(JwtError::InvalidKey("k".into())),
            AuthError::TokenError(_)
        ));
    }

    #[test]
    fn test_auth_error_display() {
        assert_eq!(AuthError::InvalidCredentials.to_string(), "Invalid credentials");
        assert_eq!(
            AuthError::WeakPassword("too short".into()).to_string(),
            "Password does not meet requirements: too short"
        );
    }
}
