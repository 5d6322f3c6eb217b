//! Pinned menu message pointer, one per chat.

use sqlx::SqlitePool;

use crate::error::Result;

/// Get the chat's current menu message id.
pub async fn get_chat_menu(pool: &SqlitePool, chat_id: i64) -> Result<Option<i64>> {
    let id: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT menu_message_id FROM chat_menu WHERE chat_id = ?
        "#,
    )
    .bind(chat_id)
    .fetch_optional(pool)
    .await?;

    Ok(id)
}

/// Overwrite the chat's menu message id.
pub async fn set_chat_menu(pool: &SqlitePool, chat_id: i64, message_id: i64) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO chat_menu (chat_id, menu_message_id)
        VALUES (?, ?)
        ON CONFLICT(chat_id) DO UPDATE SET menu_message_id = excluded.menu_message_id
        "#,
    )
    .bind(chat_id)
    .bind(message_id)
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    #[tokio::test]
    async fn test_menu_pointer_overwrites() {
        let db = Database::connect_with_pool_size("sqlite::memory:", 1)
            .await
            .unwrap();
        db.migrate().await.unwrap();
        let pool = db.pool();

        assert_eq!(get_chat_menu(pool, -1).await.unwrap(), None);

        set_chat_menu(pool, -1, 100).await.unwrap();
        assert_eq!(get_chat_menu(pool, -1).await.unwrap(), Some(100));

        set_chat_menu(pool, -1, 200).await.unwrap();
        assert_eq!(get_chat_menu(pool, -1).await.unwrap(), Some(200));

        // Other chats are independent.
        assert_eq!(get_chat_menu(pool, -2).await.unwrap(), None);
    }
}
