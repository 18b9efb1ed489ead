//! One-time password repository for SQLite operations
//!
//! One row per email. Issuing a new code upserts the row, so the previous
//! code is implicitly invalidated (last write wins by design).

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::data::sqlite::SqliteError;
use crate::data::types::OtpRow;

/// Store a code for an email, replacing any previous one
pub async fn upsert_otp(
    pool: &SqlitePool,
    email: &str,
    otp: &str,
    expires_at: i64,
) -> Result<(), SqliteError> {
    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        r#"
        INSERT INTO otp_store (id, email, otp, otp_expiration, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(email) DO UPDATE SET
            otp = excluded.otp,
            otp_expiration = excluded.otp_expiration,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&id)
    .bind(email)
    .bind(otp)
    .bind(expires_at)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get the stored record for an email
pub async fn get_otp(pool: &SqlitePool, email: &str) -> Result<Option<OtpRow>, SqliteError> {
    sqlx::query_as::<_, OtpRow>(
        "SELECT id, email, otp, otp_expiration, created_at, updated_at FROM otp_store WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .map_err(Into::into)
}

/// Clear the code and expiration for an email (consumed or expired)
pub async fn clear_otp(pool: &SqlitePool, email: &str) -> Result<(), SqliteError> {
    let now = chrono::Utc::now().timestamp();
    sqlx::query(
        "UPDATE otp_store SET otp = NULL, otp_expiration = NULL, updated_at = ? WHERE email = ?",
    )
    .bind(now)
    .bind(email)
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_test_pool() -> SqlitePool {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        sqlx::query(crate::data::sqlite::schema::SCHEMA)
            .execute(&pool)
            .await
            .unwrap();
        pool
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let pool = setup_test_pool().await;
        upsert_otp(&pool, "a@x.com", "123456", 9_999_999_999).await.unwrap();

        let row = get_otp(&pool, "a@x.com").await.unwrap().unwrap();
        assert_eq!(row.otp.as_deref(), Some("123456"));
        assert_eq!(row.otp_expiration, Some(9_999_999_999));
    }

    #[tokio::test]
    async fn test_upsert_replaces_previous_code() {
        let pool = setup_test_pool().await;
        upsert_otp(&pool, "a@x.com", "111111", 100).await.unwrap();
        upsert_otp(&pool, "a@x.com", "222222", 200).await.unwrap();

        let row = get_otp(&pool, "a@x.com").await.unwrap().unwrap();
        assert_eq!(row.otp.as_deref(), Some("222222"));
        assert_eq!(row.otp_expiration, Some(200));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM otp_store WHERE email = ?")
            .bind("a@x.com")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_clear_nulls_code_and_expiration() {
        let pool = setup_test_pool().await;
        upsert_otp(&pool, "a@x.com", "123456", 100).await.unwrap();
        clear_otp(&pool, "a@x.com").await.unwrap();

        let row = get_otp(&pool, "a@x.com").await.unwrap().unwrap();
        assert!(row.otp.is_none());
        assert!(row.otp_expiration.is_none());
    }

    #[tokio::test]
    async fn test_get_missing_email() {
        let pool = setup_test_pool().await;
        assert!(get_otp(&pool, "nobody@x.com").await.unwrap().is_none());
    }
}
