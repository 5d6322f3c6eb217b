//! Active dialog session rows, one per chat.
//!
//! Expiry and payload typing are owned by the engine's SessionManager; this
//! module is plain row storage.

use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::SessionRow;

/// Get the chat's session row, if any.
pub async fn get_session(pool: &SqlitePool, chat_id: i64) -> Result<Option<SessionRow>> {
    let row = sqlx::query_as::<_, SessionRow>(
        r#"
        SELECT user_id, state, data, started_at
        FROM active_session
        WHERE chat_id = ?
        "#,
    )
    .bind(chat_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Replace the chat's session row (last writer wins at chat granularity).
pub async fn set_session(
    pool: &SqlitePool,
    chat_id: i64,
    user_id: i64,
    state: &str,
    data: Option<&str>,
    started_at: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO active_session (chat_id, user_id, state, data, started_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(chat_id) DO UPDATE SET
            user_id = excluded.user_id,
            state = excluded.state,
            data = excluded.data,
            started_at = excluded.started_at
        "#,
    )
    .bind(chat_id)
    .bind(user_id)
    .bind(state)
    .bind(data)
    .bind(started_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Remove the chat's session row. Idempotent.
pub async fn clear_session(pool: &SqlitePool, chat_id: i64) -> Result<()> {
    sqlx::query(
        r#"
        DELETE FROM active_session WHERE chat_id = ?
        "#,
    )
    .bind(chat_id)
    .execute(pool)
    .await?;

    Ok(())
}
