//! Goal CRUD operations.

use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::{Goal, GoalKind};

/// Create a goal for a chat and return its id.
pub async fn create_goal(
    pool: &SqlitePool,
    chat_id: i64,
    name: &str,
    target: i64,
    kind: GoalKind,
    created_by: i64,
    created_at: &str,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO goals (chat_id, name, target, kind, created_by, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(chat_id)
    .bind(name)
    .bind(target)
    .bind(kind)
    .bind(created_by)
    .bind(created_at)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Get a goal by id, active or not.
///
/// Returns `None` for an id that never existed; callers decide how to treat
/// soft-deleted goals.
pub async fn get_goal(pool: &SqlitePool, goal_id: i64) -> Result<Option<Goal>> {
    let goal = sqlx::query_as::<_, Goal>(
        r#"
        SELECT goal_id, chat_id, name, target, kind, created_by, created_at, is_active
        FROM goals
        WHERE goal_id = ?
        "#,
    )
    .bind(goal_id)
    .fetch_optional(pool)
    .await?;

    Ok(goal)
}

/// List a chat's active goals, newest first.
pub async fn list_active_goals(pool: &SqlitePool, chat_id: i64) -> Result<Vec<Goal>> {
    let goals = sqlx::query_as::<_, Goal>(
        r#"
        SELECT goal_id, chat_id, name, target, kind, created_by, created_at, is_active
        FROM goals
        WHERE chat_id = ? AND is_active = 1
        ORDER BY created_at DESC
        "#,
    )
    .bind(chat_id)
    .fetch_all(pool)
    .await?;

    Ok(goals)
}

/// Soft-delete a goal. Progress rows are kept for historical views.
pub async fn deactivate_goal(pool: &SqlitePool, goal_id: i64) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE goals SET is_active = 0 WHERE goal_id = ?
        "#,
    )
    .bind(goal_id)
    .execute(pool)
    .await?;

    Ok(())
}
