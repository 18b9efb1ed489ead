//! One-time password service
//!
//! Codes are 6-digit, single-use, and short-lived. One live code per email:
//! issuing a new code overwrites the previous one (last write wins; an
//! in-flight delivery of an overwritten code is an accepted race).

use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::Rng;

use crate::api::types::ApiError;
use crate::core::constants::{OTP_MAX, OTP_MIN};
use crate::data::TransactionalService;
use crate::email::Mailer;
use crate::utils::crypto;

pub struct OtpService {
    database: Arc<TransactionalService>,
    mailer: Arc<dyn Mailer>,
    ttl_minutes: i64,
}

impl OtpService {
    pub fn new(
        database: Arc<TransactionalService>,
        mailer: Arc<dyn Mailer>,
        ttl_minutes: i64,
    ) -> Self {
        Self {
            database,
            mailer,
            ttl_minutes,
        }
    }

    /// Produce a 6-digit code, uniformly sampled.
    ///
    /// No cryptographic hardness requirement: the code is single-use,
    /// short-lived, and delivered out-of-band.
    pub fn generate_otp() -> String {
        let code: u32 = rand::thread_rng().gen_range(OTP_MIN..=OTP_MAX);
        code.to_string()
    }

    /// Store a code for an email and dispatch the delivery email.
    ///
    /// The code is persisted before delivery is attempted; a failed delivery
    /// leaves the stored code valid (not rolled back, no retry).
    pub async fn store_otp(&self, email: &str, otp: &str) -> Result<(), ApiError> {
        let expires_at = (Utc::now() + Duration::minutes(self.ttl_minutes)).timestamp();

        self.database
            .repository()
            .upsert_otp(email, otp, expires_at)
            .await
            .map_err(ApiError::from_data)?;

        let body = format!(
            "Your OTP code is {}. It is valid for {} minutes.",
            otp, self.ttl_minutes
        );
        if let Err(e) = self.mailer.send(email, "Your OTP Code", &body).await {
            tracing::error!(%email, error = %e, "Failed to deliver OTP email");
            return Err(ApiError::internal("Failed to send OTP email"));
        }

        Ok(())
    }

    /// Check a submitted code for an email.
    ///
    /// Expired records are cleared as a side effect (lazy expiry cleanup).
    /// A matching code is cleared before returning true (single-use); a
    /// mismatch leaves the record intact so the user can retry until expiry.
    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<bool, ApiError> {
        let repo = self.database.repository();

        let Some(entry) = repo.get_otp(email).await.map_err(ApiError::from_data)? else {
            return Ok(false);
        };
        let (Some(code), Some(expiration)) = (entry.otp, entry.otp_expiration) else {
            return Ok(false);
        };

        if expiration < Utc::now().timestamp() {
            repo.clear_otp(email).await.map_err(ApiError::from_data)?;
            tracing::debug!(%email, "Expired OTP cleared");
            return Ok(false);
        }

        let is_valid = crypto::constant_time_eq(&code, otp);
        if is_valid {
            repo.clear_otp(email).await.map_err(ApiError::from_data)?;
        }

        Ok(is_valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::LogMailer;
    use sqlx::SqlitePool;

    async fn setup() -> OtpService {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        sqlx::query(crate::data::sqlite::schema::SCHEMA)
            .execute(&pool)
            .await
            .unwrap();
        OtpService::new(
            Arc::new(TransactionalService::from_pool(pool)),
            Arc::new(LogMailer),
            5,
        )
    }

    #[test]
    fn test_generate_otp_is_six_digits() {
        for _ in 0..100 {
            let code = OtpService::generate_otp();
            assert_eq!(code.len(), 6);
            let value: u32 = code.parse().unwrap();
            assert!((OTP_MIN..=OTP_MAX).contains(&value));
        }
    }

    #[tokio::test]
    async fn test_verify_accepts_stored_code_once() {
        let service = setup().await;
        service.store_otp("a@x.com", "123456").await.unwrap();

        assert!(service.verify_otp("a@x.com", "123456").await.unwrap());
        // Single-use: the same code must not verify twice
        assert!(!service.verify_otp("a@x.com", "123456").await.unwrap());
    }

    #[tokio::test]
    async fn test_mismatch_leaves_code_valid_for_retry() {
        let service = setup().await;
        service.store_otp("a@x.com", "123456").await.unwrap();

        assert!(!service.verify_otp("a@x.com", "654321").await.unwrap());
        assert!(service.verify_otp("a@x.com", "123456").await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_unknown_email_fails() {
        let service = setup().await;
        assert!(!service.verify_otp("nobody@x.com", "123456").await.unwrap());
    }

    #[tokio::test]
    async fn test_new_code_invalidates_previous_one() {
        let service = setup().await;
        service.store_otp("a@x.com", "111111").await.unwrap();
        service.store_otp("a@x.com", "222222").await.unwrap();

        assert!(!service.verify_otp("a@x.com", "111111").await.unwrap());
        assert!(service.verify_otp("a@x.com", "222222").await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_code_fails_and_clears_record() {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        sqlx::query(crate::data::sqlite::schema::SCHEMA)
            .execute(&pool)
            .await
            .unwrap();
        let repo_db = Arc::new(TransactionalService::from_pool(pool));
        let service = OtpService::new(repo_db.clone(), Arc::new(LogMailer), 5);

        // Store a code that is already past its expiration
        let past = Utc::now().timestamp() - 60;
        repo_db
            .repository()
            .upsert_otp("a@x.com", "123456", past)
            .await
            .unwrap();

        assert!(!service.verify_otp("a@x.com", "123456").await.unwrap());

        let entry = repo_db.repository().get_otp("a@x.com").await.unwrap().unwrap();
        assert!(entry.otp.is_none());
        assert!(entry.otp_expiration.is_none());
    }
}
