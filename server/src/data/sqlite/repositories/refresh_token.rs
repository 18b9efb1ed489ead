//! Refresh token repository for SQLite operations
//!
//! Persisted refresh tokens make sessions revocable independently of the
//! token's own embedded expiry. Several live rows per user are allowed
//! (multi-device). There is no background sweep; stale rows expire lazily
//! through the `expires_at` check at refresh time.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::data::sqlite::SqliteError;
use crate::data::types::RefreshTokenRow;

/// Persist a refresh token with its absolute expiry
pub async fn insert_refresh_token(
    pool: &SqlitePool,
    token: &str,
    user_email: &str,
    expires_at: i64,
) -> Result<RefreshTokenRow, SqliteError> {
    let id = Uuid::new_v4().to_string();

    sqlx::query("INSERT INTO refresh_tokens (id, token, user_email, expires_at) VALUES (?, ?, ?, ?)")
        .bind(&id)
        .bind(token)
        .bind(user_email)
        .bind(expires_at)
        .execute(pool)
        .await?;

    Ok(RefreshTokenRow {
        id,
        token: token.to_string(),
        user_email: user_email.to_string(),
        expires_at,
    })
}

/// Look up a persisted token by (token, email)
pub async fn get_refresh_token(
    pool: &SqlitePool,
    token: &str,
    user_email: &str,
) -> Result<Option<RefreshTokenRow>, SqliteError> {
    sqlx::query_as::<_, RefreshTokenRow>(
        "SELECT id, token, user_email, expires_at FROM refresh_tokens WHERE token = ? AND user_email = ?",
    )
    .bind(token)
    .bind(user_email)
    .fetch_optional(pool)
    .await
    .map_err(Into::into)
}

/// Delete a persisted token; returns whether a row was removed
pub async fn delete_refresh_token(
    pool: &SqlitePool,
    token: &str,
    user_email: &str,
) -> Result<bool, SqliteError> {
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE token = ? AND user_email = ?")
        .bind(token)
        .bind(user_email)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
