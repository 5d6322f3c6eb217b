//! Per-user scratch values (e.g. the statistics page cursor).

use sqlx::SqlitePool;

use crate::error::Result;

/// Set a scratch value for a user.
pub async fn set_value(pool: &SqlitePool, user_id: i64, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO scratch (user_id, key, value)
        VALUES (?, ?, ?)
        ON CONFLICT(user_id, key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(user_id)
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get a scratch value for a user.
pub async fn get_value(pool: &SqlitePool, user_id: i64, key: &str) -> Result<Option<String>> {
    let value: Option<String> = sqlx::query_scalar(
        r#"
        SELECT value FROM scratch WHERE user_id = ? AND key = ?
        "#,
    )
    .bind(user_id)
    .bind(key)
    .fetch_optional(pool)
    .await?;

    Ok(value)
}

/// Remove all scratch values for a user. Idempotent.
pub async fn clear(pool: &SqlitePool, user_id: i64) -> Result<()> {
    sqlx::query(
        r#"
        DELETE FROM scratch WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    #[tokio::test]
    async fn test_scratch_roundtrip() {
        let db = Database::connect_with_pool_size("sqlite::memory:", 1)
            .await
            .unwrap();
        db.migrate().await.unwrap();
        let pool = db.pool();

        assert_eq!(get_value(pool, 1, "stats_page").await.unwrap(), None);

        set_value(pool, 1, "stats_page", "0").await.unwrap();
        set_value(pool, 1, "stats_page", "2").await.unwrap();
        assert_eq!(get_value(pool, 1, "stats_page").await.unwrap().as_deref(), Some("2"));

        clear(pool, 1).await.unwrap();
        assert_eq!(get_value(pool, 1, "stats_page").await.unwrap(), None);
    }
}
