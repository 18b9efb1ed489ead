//! Authentication manager
//!
//! Issues and verifies the dual-token session: a short-lived stateless
//! access token and a longer-lived refresh token that is also persisted so
//! it can be revoked before its embedded expiry elapses.

use std::sync::Arc;

use chrono::Utc;

use super::jwt::{JwtError, TokenClaims, create_token, validate_token};
use crate::api::types::ApiError;
use crate::core::config::AuthConfig;
use crate::data::TransactionalService;

/// Token pair issued on login
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct AuthManager {
    database: Arc<TransactionalService>,
    config: AuthConfig,
}

impl AuthManager {
    pub fn new(database: Arc<TransactionalService>, config: AuthConfig) -> Self {
        Self { database, config }
    }

    pub fn access_ttl_secs(&self) -> i64 {
        self.config.access_ttl_secs
    }

    pub fn refresh_ttl_secs(&self) -> i64 {
        self.config.refresh_ttl_secs
    }

    /// Mint a stateless access token
    pub fn create_access_token(&self, email: &str, user_id: &str) -> Result<String, ApiError> {
        create_token(
            self.config.access_secret.as_bytes(),
            email,
            user_id,
            self.config.access_ttl_secs,
        )
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to sign access token");
            ApiError::internal("Failed to issue token")
        })
    }

    /// Issue a full session: access token plus a persisted refresh token
    pub async fn issue_session(
        &self,
        email: &str,
        user_id: &str,
    ) -> Result<SessionTokens, ApiError> {
        let access_token = self.create_access_token(email, user_id)?;

        let refresh_token = create_token(
            self.config.refresh_secret.as_bytes(),
            email,
            user_id,
            self.config.refresh_ttl_secs,
        )
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to sign refresh token");
            ApiError::internal("Failed to issue token")
        })?;

        let expires_at = Utc::now().timestamp() + self.config.refresh_ttl_secs;
        self.database
            .repository()
            .insert_refresh_token(&refresh_token, email, expires_at)
            .await
            .map_err(ApiError::from_data)?;

        Ok(SessionTokens {
            access_token,
            refresh_token,
        })
    }

    /// Validate an access token
    pub fn validate_access_token(&self, token: &str) -> Result<TokenClaims, JwtError> {
        validate_token(token, self.config.access_secret.as_bytes())
    }

    /// Validate a refresh token signature and embedded expiry.
    ///
    /// Returns `None` on any failure; the cause is logged, never surfaced.
    pub fn verify_refresh_token(&self, token: &str) -> Option<TokenClaims> {
        match validate_token(token, self.config.refresh_secret.as_bytes()) {
            Ok(claims) => Some(claims),
            Err(e) => {
                tracing::debug!(error = %e, "Refresh token rejected");
                None
            }
        }
    }

    /// Mint a new access token from a refresh token.
    ///
    /// The signature check alone is not enough: the persisted row is
    /// re-fetched by (token, email) and its absolute expiry re-checked, so a
    /// signature-valid but revoked (deleted) token fails even though its
    /// embedded expiry has not elapsed. The refresh token itself is not
    /// rotated.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<String, ApiError> {
        let unauthorized =
            || ApiError::unauthorized("TOKEN_INVALID", "Invalid or expired refresh token");

        let claims = self
            .verify_refresh_token(refresh_token)
            .ok_or_else(unauthorized)?;

        let stored = self
            .database
            .repository()
            .get_refresh_token(refresh_token, claims.email())
            .await
            .map_err(ApiError::from_data)?;

        let Some(stored) = stored else {
            tracing::debug!(email = %claims.email(), "Refresh token not found in store (revoked)");
            return Err(unauthorized());
        };
        if stored.expires_at < Utc::now().timestamp() {
            tracing::debug!(email = %claims.email(), "Stored refresh token past expiry");
            return Err(unauthorized());
        }

        self.create_access_token(claims.email(), claims.user_id())
    }

    /// Best-effort revocation, used on logout. Failure is logged, not
    /// propagated; logout must succeed regardless.
    pub async fn revoke_refresh_token(&self, token: &str, user_email: &str) {
        if let Err(e) = self
            .database
            .repository()
            .delete_refresh_token(token, user_email)
            .await
        {
            tracing::warn!(%user_email, error = %e, "Failed to delete refresh token");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::SqlitePool;

    async fn setup() -> (AuthManager, Arc<TransactionalService>) {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        sqlx::query(crate::data::sqlite::schema::SCHEMA)
            .execute(&pool)
            .await
            .unwrap();
        let database = Arc::new(TransactionalService::from_pool(pool));
        let manager = AuthManager::new(
            database.clone(),
            AuthConfig {
                access_secret: "access-secret".to_string(),
                access_ttl_secs: 3600,
                refresh_secret: "refresh-secret".to_string(),
                refresh_ttl_secs: 86_400,
                otp_ttl_minutes: 5,
            },
        );
        (manager, database)
    }

    #[tokio::test]
    async fn test_issue_session_persists_refresh_token() {
        let (manager, database) = setup().await;
        let tokens = manager.issue_session("a@x.com", "user-1").await.unwrap();

        let stored = database
            .repository()
            .get_refresh_token(&tokens.refresh_token, "a@x.com")
            .await
            .unwrap();
        assert!(stored.is_some());
    }

    #[tokio::test]
    async fn test_access_and_refresh_secrets_are_distinct() {
        let (manager, _) = setup().await;
        let tokens = manager.issue_session("a@x.com", "user-1").await.unwrap();

        // An access token must not verify as a refresh token and vice versa
        assert!(manager.verify_refresh_token(&tokens.access_token).is_none());
        assert!(manager.validate_access_token(&tokens.refresh_token).is_err());
    }

    #[tokio::test]
    async fn test_refresh_mints_new_access_token() {
        let (manager, _) = setup().await;
        let tokens = manager.issue_session("a@x.com", "user-1").await.unwrap();

        let access = manager
            .refresh_access_token(&tokens.refresh_token)
            .await
            .unwrap();
        let claims = manager.validate_access_token(&access).unwrap();
        assert_eq!(claims.email(), "a@x.com");
        assert_eq!(claims.user_id(), "user-1");
    }

    #[tokio::test]
    async fn test_revoked_refresh_token_fails_despite_valid_signature() {
        let (manager, database) = setup().await;
        let tokens = manager.issue_session("a@x.com", "user-1").await.unwrap();

        // Revoke: signature and embedded expiry are still valid afterwards
        database
            .repository()
            .delete_refresh_token(&tokens.refresh_token, "a@x.com")
            .await
            .unwrap();
        assert!(manager.verify_refresh_token(&tokens.refresh_token).is_some());

        let err = manager
            .refresh_access_token(&tokens.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn test_stale_stored_expiry_fails_refresh() {
        let (manager, database) = setup().await;
        let tokens = manager.issue_session("a@x.com", "user-1").await.unwrap();

        // Force the persisted row past its absolute expiry
        sqlx::query("UPDATE refresh_tokens SET expires_at = ? WHERE token = ?")
            .bind(Utc::now().timestamp() - 10)
            .bind(&tokens.refresh_token)
            .execute(database.pool())
            .await
            .unwrap();

        let err = manager
            .refresh_access_token(&tokens.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn test_garbage_refresh_token_fails() {
        let (manager, _) = setup().await;
        let err = manager
            .refresh_access_token("not-a-token")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn test_revoke_is_best_effort() {
        let (manager, _) = setup().await;
        // Revoking a token that does not exist must not fail
        manager.revoke_refresh_token("missing-token", "a@x.com").await;
    }

    #[tokio::test]
    async fn test_multi_device_sessions_are_independent() {
        let (manager, _) = setup().await;
        let first = manager.issue_session("a@x.com", "user-1").await.unwrap();
        let second = manager.issue_session("a@x.com", "user-1").await.unwrap();

        manager
            .revoke_refresh_token(&first.refresh_token, "a@x.com")
            .await;

        assert!(manager.refresh_access_token(&first.refresh_token).await.is_err());
        assert!(manager
            .refresh_access_token(&second.refresh_token)
            .await
            .is_ok());
    }
}
