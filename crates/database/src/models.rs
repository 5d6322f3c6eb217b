//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A group member, identified by their chat-platform user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Chat-platform user id.
    pub user_id: i64,
    /// Display name (1-20 characters).
    pub name: String,
    /// RFC 3339 timestamp of registration.
    pub joined_at: String,
    /// Whether the member wants activity notifications.
    pub notifications: bool,
    /// Soft-delete flag.
    pub is_active: bool,
}

/// Whether a goal target applies per day or per month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum GoalKind {
    Daily,
    Monthly,
}

impl GoalKind {
    /// Wire tag used in callback payloads and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalKind::Daily => "daily",
            GoalKind::Monthly => "monthly",
        }
    }
}

/// A shared goal for one chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Goal {
    /// Auto-incrementing id.
    pub goal_id: i64,
    /// Owning chat.
    pub chat_id: i64,
    /// Goal name (1-30 characters).
    pub name: String,
    /// Numeric target (1-10000).
    pub target: i64,
    /// Daily or monthly.
    pub kind: GoalKind,
    /// User who created the goal.
    pub created_by: i64,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    /// Soft-delete flag.
    pub is_active: bool,
}

/// A recent activity joined with the acting user's display name.
///
/// Activity rows themselves are append-only and write-only; this is the
/// only shape reads come back in.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct RecentActivity {
    pub name: String,
    pub action: String,
    pub detail: String,
    pub created_at: String,
}

/// The raw persisted form of a chat's in-flight dialog.
///
/// Expiry and payload typing are interpreted by the engine's SessionManager;
/// the database only stores the row.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct SessionRow {
    pub user_id: i64,
    /// State tag (e.g. "waiting_for_goal_target").
    pub state: String,
    /// JSON payload for payload-carrying states.
    pub data: Option<String>,
    /// RFC 3339 timestamp of when the dialog started.
    pub started_at: String,
}
