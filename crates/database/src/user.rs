//! Member CRUD operations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::User;

/// Register a new member.
///
/// Fails with [`DatabaseError::AlreadyExists`] if the user id is taken,
/// including soft-deleted profiles (re-registration revives nothing).
pub async fn create_user(pool: &SqlitePool, user_id: i64, name: &str, joined_at: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO users (user_id, name, joined_at)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(name)
    .bind(joined_at)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "User",
                    id: user_id.to_string(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(())
}

/// Get a member by id.
pub async fn get_user(pool: &SqlitePool, user_id: i64) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT user_id, name, joined_at, notifications, is_active
        FROM users
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "User",
        id: user_id.to_string(),
    })
}

/// Whether a user id belongs to an active (registered, not deleted) member.
pub async fn is_registered(pool: &SqlitePool, user_id: i64) -> Result<bool> {
    let row: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT 1 FROM users WHERE user_id = ? AND is_active = 1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}

/// Rename a member.
pub async fn rename_user(pool: &SqlitePool, user_id: i64, new_name: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET name = ?
        WHERE user_id = ?
        "#,
    )
    .bind(new_name)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "User",
            id: user_id.to_string(),
        });
    }

    Ok(())
}

/// Flip the notifications flag and return the new value.
pub async fn toggle_notifications(pool: &SqlitePool, user_id: i64) -> Result<bool> {
    sqlx::query_scalar::<_, bool>(
        r#"
        UPDATE users
        SET notifications = 1 - notifications
        WHERE user_id = ?
        RETURNING notifications
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "User",
        id: user_id.to_string(),
    })
}

/// Soft-delete a member and purge their progress rows.
///
/// Goal history is untouched; only this user's own progress disappears.
pub async fn deactivate_user(pool: &SqlitePool, user_id: i64) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE users SET is_active = 0 WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        DELETE FROM user_progress WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

/// List active members, oldest first.
pub async fn list_active_users(pool: &SqlitePool) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT user_id, name, joined_at, notifications, is_active
        FROM users
        WHERE is_active = 1
        ORDER BY joined_at
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(users)
}
