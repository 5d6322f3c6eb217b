//! Progress rows: the contended (user, goal, date) accumulators.

use sqlx::SqlitePool;

use crate::error::Result;

/// Per-day totals for a week aggregation query.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct WeekRow {
    /// ISO date (YYYY-MM-DD).
    pub date: String,
    /// Sum of all progress values on that date.
    pub total: i64,
    /// Distinct contributing users on that date.
    pub participants: i64,
}

/// One cell of the goal x user cross join for a day.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct DayRow {
    pub goal_id: i64,
    pub goal_name: String,
    pub target: i64,
    pub user_id: i64,
    pub user_name: String,
    pub value: i64,
}

/// Per-user lifetime statistics for the settings view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UserTotals {
    /// Count of distinct dates with any progress.
    pub active_days: i64,
    /// Sum of values on the given "today" date.
    pub today_total: i64,
    /// Sum of values over all time.
    pub overall_total: i64,
}

/// Value of the single (user, goal, date) row, or 0 when absent.
pub async fn day_value(pool: &SqlitePool, user_id: i64, goal_id: i64, date: &str) -> Result<i64> {
    let value: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT value FROM user_progress
        WHERE user_id = ? AND goal_id = ? AND date = ?
        "#,
    )
    .bind(user_id)
    .bind(goal_id)
    .bind(date)
    .fetch_optional(pool)
    .await?;

    Ok(value.unwrap_or(0))
}

/// Atomically add `amount` to the (user, goal, date) row and return the new
/// total.
///
/// The read-modify-write happens inside a single conditional upsert so that
/// concurrent increments for the same key cannot lose updates.
pub async fn add_to_progress(
    pool: &SqlitePool,
    user_id: i64,
    goal_id: i64,
    date: &str,
    amount: i64,
) -> Result<i64> {
    let value = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO user_progress (user_id, goal_id, date, value)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (user_id, goal_id, date)
        DO UPDATE SET value = value + excluded.value
        RETURNING value
        "#,
    )
    .bind(user_id)
    .bind(goal_id)
    .bind(date)
    .bind(amount)
    .fetch_one(pool)
    .await?;

    Ok(value)
}

/// Per-day totals for the 7 dates starting at `start_date` (inclusive).
///
/// Joins through goals by chat without an activity filter: progress logged
/// against a since-deleted goal still counts in historical week totals.
pub async fn week_rows(
    pool: &SqlitePool,
    chat_id: i64,
    start_date: &str,
    end_date: &str,
) -> Result<Vec<WeekRow>> {
    let rows = sqlx::query_as::<_, WeekRow>(
        r#"
        SELECT up.date, COALESCE(SUM(up.value), 0) AS total,
               COUNT(DISTINCT up.user_id) AS participants
        FROM user_progress up
        JOIN goals g ON g.goal_id = up.goal_id
        WHERE g.chat_id = ? AND up.date BETWEEN ? AND ?
        GROUP BY up.date
        ORDER BY up.date
        "#,
    )
    .bind(chat_id)
    .bind(start_date)
    .bind(end_date)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Full cross join of a chat's active goals x active users for one date.
///
/// Users without an entry appear with value 0 so completion ratios count
/// everyone.
pub async fn day_rows(pool: &SqlitePool, chat_id: i64, date: &str) -> Result<Vec<DayRow>> {
    let rows = sqlx::query_as::<_, DayRow>(
        r#"
        SELECT g.goal_id, g.name AS goal_name, g.target,
               u.user_id, u.name AS user_name, COALESCE(up.value, 0) AS value
        FROM goals g
        CROSS JOIN users u
        LEFT JOIN user_progress up
            ON up.goal_id = g.goal_id AND up.user_id = u.user_id AND up.date = ?
        WHERE g.chat_id = ? AND g.is_active = 1 AND u.is_active = 1
        ORDER BY g.created_at, u.joined_at
        "#,
    )
    .bind(date)
    .bind(chat_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Lifetime totals for one user, with "today" passed in explicitly.
pub async fn user_totals(pool: &SqlitePool, user_id: i64, today: &str) -> Result<UserTotals> {
    let active_days: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(DISTINCT date) FROM user_progress WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    let today_total: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(value), 0) FROM user_progress WHERE user_id = ? AND date = ?
        "#,
    )
    .bind(user_id)
    .bind(today)
    .fetch_one(pool)
    .await?;

    let overall_total: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(value), 0) FROM user_progress WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(UserTotals {
        active_days,
        today_total,
        overall_total,
    })
}

/// Delete a user's rows for exactly one date.
pub async fn reset_on_date(pool: &SqlitePool, user_id: i64, date: &str) -> Result<()> {
    sqlx::query(
        r#"
        DELETE FROM user_progress WHERE user_id = ? AND date = ?
        "#,
    )
    .bind(user_id)
    .bind(date)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete a user's rows on or after a date (week reset).
pub async fn reset_since(pool: &SqlitePool, user_id: i64, since: &str) -> Result<()> {
    sqlx::query(
        r#"
        DELETE FROM user_progress WHERE user_id = ? AND date >= ?
        "#,
    )
    .bind(user_id)
    .bind(since)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete every row for a user.
pub async fn reset_all(pool: &SqlitePool, user_id: i64) -> Result<()> {
    sqlx::query(
        r#"
        DELETE FROM user_progress WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(())
}
