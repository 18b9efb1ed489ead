//! User repository for SQLite operations

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::data::sqlite::SqliteError;
use crate::data::types::{UserRow, UserUpdate};

const USER_COLUMNS: &str =
    "id, email, first_name, last_name, profile_picture, created_at, updated_at";

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Get a user by ID
pub async fn get_user(pool: &SqlitePool, id: &str) -> Result<Option<UserRow>, SqliteError> {
    sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(Into::into)
}

/// Get a user by email
pub async fn get_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<UserRow>, SqliteError> {
    fetch_by_email(pool, email).await
}

async fn fetch_by_email<'e, E>(executor: E, email: &str) -> Result<Option<UserRow>, SqliteError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
    ))
    .bind(email)
    .fetch_optional(executor)
    .await
    .map_err(Into::into)
}

/// Create-or-fetch a minimal user stub for an email.
///
/// Runs in a transaction: the existence re-check and the insert are atomic,
/// so two concurrent first-time OTP requests converge on a single row. A
/// unique-constraint violation from a racing insert is translated into the
/// winner's row, never surfaced as a raw storage error.
pub async fn create_temporary_user(
    pool: &SqlitePool,
    email: &str,
) -> Result<UserRow, SqliteError> {
    let mut tx = pool.begin().await?;

    if let Some(existing) = fetch_by_email(&mut *tx, email).await? {
        tx.rollback().await?;
        return Ok(existing);
    }

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().timestamp();

    let inserted = sqlx::query("INSERT INTO users (id, email, created_at, updated_at) VALUES (?, ?, ?, ?)")
        .bind(&id)
        .bind(email)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await;

    match inserted {
        Ok(_) => {
            tx.commit().await?;
            Ok(UserRow {
                id,
                email: email.to_string(),
                first_name: None,
                last_name: None,
                profile_picture: None,
                created_at: now,
                updated_at: now,
            })
        }
        Err(e) if is_unique_violation(&e) => {
            tx.rollback().await?;
            fetch_by_email(pool, email).await?.ok_or_else(|| {
                SqliteError::Conflict(format!("User with email {} already exists", email))
            })
        }
        Err(e) => Err(e.into()),
    }
}

/// Ids of companies owned by a user, oldest first.
///
/// The onboarding flag is derived from this list at read time; it is never
/// read from a stored column.
pub async fn owned_company_ids(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<String>, SqliteError> {
    let rows = sqlx::query_as::<_, (String,)>(
        "SELECT id FROM companies WHERE belongs_to = ? ORDER BY created_at",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Apply a partial update and return the updated row
pub async fn update_user(
    pool: &SqlitePool,
    id: &str,
    update: &UserUpdate,
) -> Result<Option<UserRow>, SqliteError> {
    let Some(existing) = get_user(pool, id).await? else {
        return Ok(None);
    };

    let first_name = update.first_name.clone().or(existing.first_name);
    let last_name = update.last_name.clone().or(existing.last_name);
    let profile_picture = update.profile_picture.clone().or(existing.profile_picture);
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        "UPDATE users SET first_name = ?, last_name = ?, profile_picture = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&first_name)
    .bind(&last_name)
    .bind(&profile_picture)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(Some(UserRow {
        id: existing.id,
        email: existing.email,
        first_name,
        last_name,
        profile_picture,
        created_at: existing.created_at,
        updated_at: now,
    }))
}

/// Delete a user; owned companies cascade per schema rules
pub async fn delete_user(pool: &SqlitePool, id: &str) -> Result<bool, SqliteError> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
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
    async fn test_create_temporary_user() {
        let pool = setup_test_pool().await;
        let user = create_temporary_user(&pool, "new@example.com").await.unwrap();

        assert!(!user.id.is_empty());
        assert_eq!(user.email, "new@example.com");
        assert!(user.first_name.is_none());
        assert!(user.last_name.is_none());
    }

    #[tokio::test]
    async fn test_create_temporary_user_is_idempotent() {
        let pool = setup_test_pool().await;
        let first = create_temporary_user(&pool, "same@example.com").await.unwrap();
        let second = create_temporary_user(&pool, "same@example.com").await.unwrap();

        assert_eq!(first.id, second.id);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind("same@example.com")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_get_by_email() {
        let pool = setup_test_pool().await;
        create_temporary_user(&pool, "lookup@example.com").await.unwrap();

        let fetched = get_by_email(&pool, "lookup@example.com").await.unwrap();
        assert!(fetched.is_some());

        let missing = get_by_email(&pool, "absent@example.com").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_update_user_merges_fields() {
        let pool = setup_test_pool().await;
        let user = create_temporary_user(&pool, "update@example.com").await.unwrap();

        let updated = update_user(
            &pool,
            &user.id,
            &UserUpdate {
                first_name: Some("Ada".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(updated.first_name.as_deref(), Some("Ada"));

        // A later partial update must not clobber the earlier field
        let updated = update_user(
            &pool,
            &user.id,
            &UserUpdate {
                last_name: Some("Lovelace".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(updated.first_name.as_deref(), Some("Ada"));
        assert_eq!(updated.last_name.as_deref(), Some("Lovelace"));
    }

    #[tokio::test]
    async fn test_delete_user() {
        let pool = setup_test_pool().await;
        let user = create_temporary_user(&pool, "gone@example.com").await.unwrap();

        assert!(delete_user(&pool, &user.id).await.unwrap());
        assert!(get_user(&pool, &user.id).await.unwrap().is_none());
        assert!(!delete_user(&pool, &user.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_creation_yields_one_row() {
        use crate::core::config::DatabaseConfig;
        use crate::data::sqlite::SqliteService;

        let service = SqliteService::init(&DatabaseConfig {
            path: ":memory:".to_string(),
        })
        .await
        .unwrap();
        let pool = service.pool().clone();

        let (first, second) = tokio::join!(
            create_temporary_user(&pool, "race@example.com"),
            create_temporary_user(&pool, "race@example.com"),
        );
        let first = first.unwrap();
        let second = second.unwrap();
        assert_eq!(first.id, second.id);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind("race@example.com")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_owned_company_ids_empty_for_new_user() {
        let pool = setup_test_pool().await;
        let user = create_temporary_user(&pool, "fresh@example.com").await.unwrap();

        let ids = owned_company_ids(&pool, &user.id).await.unwrap();
        assert!(ids.is_empty());
    }
}
