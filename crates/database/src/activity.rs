//! Append-only activity log.

use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::RecentActivity;

/// Append an activity record. Records are never mutated or deleted.
pub async fn log_activity(
    pool: &SqlitePool,
    chat_id: i64,
    user_id: i64,
    action: &str,
    detail: &str,
    created_at: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO activities (chat_id, user_id, action, detail, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(chat_id)
    .bind(user_id)
    .bind(action)
    .bind(detail)
    .bind(created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// The most recent activities for a chat, joined with the actor's name.
pub async fn recent_activities(
    pool: &SqlitePool,
    chat_id: i64,
    limit: i64,
) -> Result<Vec<RecentActivity>> {
    let rows = sqlx::query_as::<_, RecentActivity>(
        r#"
        SELECT u.name, a.action, a.detail, a.created_at
        FROM activities a
        JOIN users u ON u.user_id = a.user_id
        WHERE a.chat_id = ?
        ORDER BY a.created_at DESC
        LIMIT ?
        "#,
    )
    .bind(chat_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
