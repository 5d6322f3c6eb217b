//! Button actions and their callback wire tags.
//!
//! Tags are the exact strings carried in inline-keyboard callback payloads,
//! so existing clients keep working; dispatch happens on the closed enum,
//! never on raw strings.

use chrono::NaiveDate;

/// Every button the bot's keyboards can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    CreateProfile,
    AddGoal,
    MarkProgress,
    /// Pick a goal to log progress against.
    SelectGoal(i64),
    GoalTypeDaily,
    GoalTypeMonthly,
    Statistics,
    /// One week newer (lower page index).
    StatisticsPrev,
    /// One week older (higher page index).
    StatisticsNext,
    StatisticsToday,
    StatisticsBack,
    /// Open the detailed view for one day.
    StatsDay(NaiveDate),
    Settings,
    ChangeName,
    ToggleNotifications,
    ResetMenu,
    ResetToday,
    ResetWeek,
    ResetAll,
    DeleteProfile,
    DeleteGoal,
    /// Ask for confirmation before deleting a goal.
    ConfirmDelete(i64),
    /// Actually delete a goal.
    ExecuteDelete(i64),
    Help,
    Cancel,
    MainMenu,
    Noop,
}

impl ButtonAction {
    /// Parse a callback payload. Unknown payloads return `None`.
    pub fn decode(data: &str) -> Option<Self> {
        let action = match data {
            "create_profile" => Self::CreateProfile,
            "add_goal" => Self::AddGoal,
            "mark_progress" => Self::MarkProgress,
            "goal_type_daily" => Self::GoalTypeDaily,
            "goal_type_monthly" => Self::GoalTypeMonthly,
            "statistics" => Self::Statistics,
            "statistics_prev" => Self::StatisticsPrev,
            "statistics_next" => Self::StatisticsNext,
            "statistics_today" => Self::StatisticsToday,
            // "stats_back" is a legacy alias kept for old keyboards.
            "statistics_back" | "stats_back" => Self::StatisticsBack,
            "settings" => Self::Settings,
            "change_name" => Self::ChangeName,
            "toggle_notifications" => Self::ToggleNotifications,
            "reset_menu" => Self::ResetMenu,
            "reset_today" => Self::ResetToday,
            "reset_week" => Self::ResetWeek,
            "reset_all" => Self::ResetAll,
            "delete_profile" => Self::DeleteProfile,
            "delete_goal" => Self::DeleteGoal,
            "help" => Self::Help,
            "cancel" => Self::Cancel,
            "main_menu" => Self::MainMenu,
            "noop" => Self::Noop,
            _ => {
                if let Some(rest) = data.strip_prefix("select_goal_") {
                    Self::SelectGoal(rest.parse().ok()?)
                } else if let Some(rest) = data.strip_prefix("confirm_delete_") {
                    Self::ConfirmDelete(rest.parse().ok()?)
                } else if let Some(rest) = data.strip_prefix("execute_delete_") {
                    Self::ExecuteDelete(rest.parse().ok()?)
                } else if let Some(rest) = data.strip_prefix("stats_day_") {
                    Self::StatsDay(rest.parse().ok()?)
                } else {
                    return None;
                }
            }
        };
        Some(action)
    }

    /// The callback payload for this action.
    pub fn encode(&self) -> String {
        match self {
            Self::CreateProfile => "create_profile".to_string(),
            Self::AddGoal => "add_goal".to_string(),
            Self::MarkProgress => "mark_progress".to_string(),
            Self::SelectGoal(id) => format!("select_goal_{}", id),
            Self::GoalTypeDaily => "goal_type_daily".to_string(),
            Self::GoalTypeMonthly => "goal_type_monthly".to_string(),
            Self::Statistics => "statistics".to_string(),
            Self::StatisticsPrev => "statistics_prev".to_string(),
            Self::StatisticsNext => "statistics_next".to_string(),
            Self::StatisticsToday => "statistics_today".to_string(),
            Self::StatisticsBack => "statistics_back".to_string(),
            Self::StatsDay(date) => format!("stats_day_{}", date),
            Self::Settings => "settings".to_string(),
            Self::ChangeName => "change_name".to_string(),
            Self::ToggleNotifications => "toggle_notifications".to_string(),
            Self::ResetMenu => "reset_menu".to_string(),
            Self::ResetToday => "reset_today".to_string(),
            Self::ResetWeek => "reset_week".to_string(),
            Self::ResetAll => "reset_all".to_string(),
            Self::DeleteProfile => "delete_profile".to_string(),
            Self::DeleteGoal => "delete_goal".to_string(),
            Self::ConfirmDelete(id) => format!("confirm_delete_{}", id),
            Self::ExecuteDelete(id) => format!("execute_delete_{}", id),
            Self::Help => "help".to_string(),
            Self::Cancel => "cancel".to_string(),
            Self::MainMenu => "main_menu".to_string(),
            Self::Noop => "noop".to_string(),
        }
    }
}
