//! Menu rendering: turns aggregator output into display text and keyboards.

use chrono::{Datelike, Duration, NaiveDate};
use database::validation::{
    ValidationError, MAX_GOAL_NAME_LENGTH, MAX_GOAL_TARGET, MAX_NAME_LENGTH,
};
use database::{Goal, GoalKind, User};

use crate::actions::ButtonAction;
use crate::stats::{percent, DayDetail, MenuSnapshot, UserStats, WeekPage};
use crate::transport::{Button, Keyboard};

/// A rendered screen: the text plus its inline keyboard.
#[derive(Debug, Clone)]
pub struct MenuView {
    pub text: String,
    pub keyboard: Keyboard,
}

/// A rejected text input, echoed back in the re-prompt.
#[derive(Debug, Clone)]
pub struct InputError {
    pub input: String,
    pub violation: ValidationError,
}

/// A goal with the calling member's progress, for the goal picker.
#[derive(Debug, Clone)]
pub struct GoalPickerRow {
    pub goal: Goal,
    pub today_value: i64,
}

/// Renders aggregator output into the pinned menu's text and keyboards.
///
/// The engine only depends on this trait; swapping presentation (other
/// languages, other markup) never touches the state machine.
pub trait MenuRenderer: Send + Sync {
    fn main_menu(&self, snapshot: &MenuSnapshot, viewer_registered: bool) -> MenuView;
    fn help(&self) -> MenuView;
    fn register_prompt(&self, error: Option<&InputError>) -> MenuView;
    fn rename_prompt(&self, error: Option<&InputError>) -> MenuView;
    fn goal_name_prompt(&self, error: Option<&InputError>) -> MenuView;
    fn goal_target_prompt(&self, goal_name: &str, error: Option<&InputError>) -> MenuView;
    fn goal_type_prompt(&self, goal_name: &str, target: i64) -> MenuView;
    fn progress_prompt(
        &self,
        goal_name: &str,
        current_and_target: Option<(i64, i64)>,
        error: Option<&InputError>,
    ) -> MenuView;
    fn goal_picker(&self, goals: &[GoalPickerRow]) -> MenuView;
    fn delete_picker(&self, goals: &[Goal]) -> MenuView;
    fn confirm_delete(&self, goal: &Goal) -> MenuView;
    fn settings(&self, user: &User, stats: &UserStats, joined: Option<NaiveDate>) -> MenuView;
    fn reset_menu(&self) -> MenuView;
    fn week_stats(&self, page: &WeekPage, page_index: i64, today: NaiveDate) -> MenuView;
    fn day_stats(&self, detail: &DayDetail) -> MenuView;
}

/// Bar width used everywhere.
const BAR_WIDTH: usize = 10;

/// Draw a progress bar. The main group bar uses solid blocks, everything
/// else the thin variant.
fn progress_bar(percentage: i64, solid: bool) -> String {
    let clamped = percentage.clamp(0, 100) as usize;
    let filled = clamped * BAR_WIDTH / 100;
    let (full, empty) = if solid { ('█', '░') } else { ('▰', '▱') };
    let mut bar = String::with_capacity(BAR_WIDTH * full.len_utf8());
    for _ in 0..filled {
        bar.push(full);
    }
    for _ in filled..BAR_WIDTH {
        bar.push(empty);
    }
    bar
}

fn cancel_row() -> Vec<Button> {
    vec![Button::new("❌ CANCEL", ButtonAction::Cancel.encode())]
}

fn back_to_menu_row() -> Vec<Button> {
    vec![Button::new("🔙 MAIN MENU", ButtonAction::MainMenu.encode())]
}

fn violation_line(error: &InputError) -> String {
    let headline = match &error.violation {
        ValidationError::NameLength { .. } => {
            format!("⚠️ The name must be 1 to {} characters", MAX_NAME_LENGTH)
        }
        ValidationError::GoalNameLength { .. } => {
            format!("⚠️ The goal name must be 1 to {} characters", MAX_GOAL_NAME_LENGTH)
        }
        ValidationError::NotANumber => "⚠️ Enter a whole number (for example: 100)".to_string(),
        ValidationError::TargetOutOfRange { .. } => {
            format!("⚠️ The target must be between 1 and {}", MAX_GOAL_TARGET)
        }
        ValidationError::AmountNotPositive { .. } => "⚠️ Enter a positive number".to_string(),
    };

    // Length violations echo the offending length alongside the input.
    match &error.violation {
        ValidationError::NameLength { actual } | ValidationError::GoalNameLength { actual } => {
            format!("{}\n\nYou entered: '{}' ({} characters)", headline, error.input, actual)
        }
        _ => format!("{}\n\nYou entered: '{}'", headline, error.input),
    }
}

/// The default English text renderer.
#[derive(Debug, Clone, Default)]
pub struct TextMenuRenderer;

impl TextMenuRenderer {
    fn kind_icon(kind: GoalKind) -> &'static str {
        match kind {
            GoalKind::Daily => "📅",
            GoalKind::Monthly => "📆",
        }
    }
}

impl MenuRenderer for TextMenuRenderer {
    fn main_menu(&self, snapshot: &MenuSnapshot, viewer_registered: bool) -> MenuView {
        let mut text = format!(
            "FITNESS GROUP\n{}\n\n👥 {} members • 🎯 {} goals\n\n",
            snapshot.today.format("%-d %B %Y"),
            snapshot.users.len(),
            snapshot.goals.len()
        );

        text.push_str("GROUP GOALS\n");
        if snapshot.goals.is_empty() {
            text.push_str("\nNo active goals yet\n");
        } else {
            for board in &snapshot.goals {
                let bar = progress_bar(board.group_percent, true);
                text.push_str(&format!(
                    "\n{} {}\n┏{}┓\n┃{}┃{:>3}%\n┗{}┛\n",
                    Self::kind_icon(board.goal.kind),
                    board.goal.name,
                    "━".repeat(BAR_WIDTH),
                    bar,
                    board.group_percent,
                    "━".repeat(BAR_WIDTH),
                ));
                for line in &board.lines {
                    text.push_str(&format!(
                        "{}: {} {}% ({}/{})\n",
                        line.name,
                        progress_bar(line.percent, false),
                        line.percent,
                        line.value,
                        board.goal.target
                    ));
                }
            }
        }

        if !snapshot.activities.is_empty() {
            text.push_str("\nRECENT ACTIVITY\n");
            for entry in &snapshot.activities {
                let time = entry
                    .created_at
                    .get(11..16)
                    .unwrap_or(&entry.created_at);
                text.push_str(&format!("\n{} - {}: {}", time, entry.name, entry.detail));
            }
        }

        let mut keyboard = Keyboard::new();
        if viewer_registered {
            keyboard.row(vec![
                Button::new("➕ ADD GOAL", ButtonAction::AddGoal.encode()),
                Button::new("✅ LOG PROGRESS", ButtonAction::MarkProgress.encode()),
            ]);
            keyboard.row(vec![
                Button::new("📊 STATISTICS", ButtonAction::Statistics.encode()),
                Button::new("⚙️ SETTINGS", ButtonAction::Settings.encode()),
            ]);
            if !snapshot.goals.is_empty() {
                keyboard.row(vec![Button::new("🗑️ DELETE GOAL", ButtonAction::DeleteGoal.encode())]);
            }
            keyboard.row(vec![Button::new(
                "👤 CREATE PROFILE",
                ButtonAction::CreateProfile.encode(),
            )]);
        } else {
            keyboard.row(vec![
                Button::new("👤 CREATE PROFILE", ButtonAction::CreateProfile.encode()),
                Button::new("❓ HELP", ButtonAction::Help.encode()),
            ]);
        }

        MenuView { text, keyboard }
    }

    fn help(&self) -> MenuView {
        let mut keyboard = Keyboard::new();
        keyboard.row(back_to_menu_row());
        MenuView {
            text: crate::engine::HELP_TEXT.to_string(),
            keyboard,
        }
    }

    fn register_prompt(&self, error: Option<&InputError>) -> MenuView {
        let mut text = "NEW MEMBER REGISTRATION\n\n".to_string();
        if let Some(error) = error {
            text.push_str(&violation_line(error));
            text.push_str("\n\n");
        }
        text.push_str("Type your name in the chat:");

        let mut keyboard = Keyboard::new();
        keyboard.row(cancel_row());
        MenuView { text, keyboard }
    }

    fn rename_prompt(&self, error: Option<&InputError>) -> MenuView {
        let mut text = "✏️ CHANGE NAME\n\n".to_string();
        if let Some(error) = error {
            text.push_str(&violation_line(error));
            text.push_str("\n\n");
        }
        text.push_str("Type your new name in the chat:");

        let mut keyboard = Keyboard::new();
        keyboard.row(cancel_row());
        MenuView { text, keyboard }
    }

    fn goal_name_prompt(&self, error: Option<&InputError>) -> MenuView {
        let mut text = "🎯 NEW GOAL\n\n".to_string();
        if let Some(error) = error {
            text.push_str(&violation_line(error));
            text.push_str("\n\n");
        }
        text.push_str("Type the goal name in the chat:");

        let mut keyboard = Keyboard::new();
        keyboard.row(cancel_row());
        MenuView { text, keyboard }
    }

    fn goal_target_prompt(&self, goal_name: &str, error: Option<&InputError>) -> MenuView {
        let mut text = format!("🎯 NEW GOAL\n\nGoal: {}\n\n", goal_name);
        if let Some(error) = error {
            text.push_str(&violation_line(error));
            text.push_str("\n\n");
        }
        text.push_str("Type the target number in the chat:");

        let mut keyboard = Keyboard::new();
        keyboard.row(cancel_row());
        MenuView { text, keyboard }
    }

    fn goal_type_prompt(&self, goal_name: &str, target: i64) -> MenuView {
        let text = format!(
            "🎯 NEW GOAL\n\nGoal: {}\nTarget: {}\n\nPick the goal type:",
            goal_name, target
        );

        let mut keyboard = Keyboard::new();
        keyboard.row(vec![
            Button::new("📅 DAILY", ButtonAction::GoalTypeDaily.encode()),
            Button::new("📆 MONTHLY", ButtonAction::GoalTypeMonthly.encode()),
        ]);
        keyboard.row(cancel_row());
        MenuView { text, keyboard }
    }

    fn progress_prompt(
        &self,
        goal_name: &str,
        current_and_target: Option<(i64, i64)>,
        error: Option<&InputError>,
    ) -> MenuView {
        let mut text = format!("✅ LOG PROGRESS\n\nGoal: {}\n", goal_name);
        if let Some((current, target)) = current_and_target {
            text.push_str(&format!("Current progress: {}/{}\n", current, target));
        }
        text.push('\n');
        if let Some(error) = error {
            text.push_str(&violation_line(error));
            text.push_str("\n\n");
        }
        text.push_str("Type the amount in the chat:");

        let mut keyboard = Keyboard::new();
        keyboard.row(cancel_row());
        MenuView { text, keyboard }
    }

    fn goal_picker(&self, goals: &[GoalPickerRow]) -> MenuView {
        let text = "✅ LOG PROGRESS\n\nPick a goal:".to_string();

        let mut keyboard = Keyboard::new();
        for row in goals {
            let pct = percent(row.today_value, row.goal.target);
            keyboard.row(vec![Button::new(
                format!(
                    "🎯 {} {} {}/{}",
                    row.goal.name,
                    progress_bar(pct, false),
                    row.today_value,
                    row.goal.target
                ),
                ButtonAction::SelectGoal(row.goal.goal_id).encode(),
            )]);
        }
        keyboard.row(back_to_menu_row());
        MenuView { text, keyboard }
    }

    fn delete_picker(&self, goals: &[Goal]) -> MenuView {
        let text = "🗑️ DELETE GOAL\n\nPick a goal to delete:".to_string();

        let mut keyboard = Keyboard::new();
        for goal in goals {
            keyboard.row(vec![Button::new(
                format!("🗑️ {}", goal.name),
                ButtonAction::ConfirmDelete(goal.goal_id).encode(),
            )]);
        }
        keyboard.row(back_to_menu_row());
        MenuView { text, keyboard }
    }

    fn confirm_delete(&self, goal: &Goal) -> MenuView {
        let text = format!(
            "🗑️ DELETE GOAL\n\nAre you sure you want to delete '{}'?",
            goal.name
        );

        let mut keyboard = Keyboard::new();
        keyboard.row(vec![Button::new(
            format!("✅ YES, delete '{}'", goal.name),
            ButtonAction::ExecuteDelete(goal.goal_id).encode(),
        )]);
        keyboard.row(vec![Button::new("❌ NO, go back", ButtonAction::DeleteGoal.encode())]);
        MenuView { text, keyboard }
    }

    fn settings(&self, user: &User, stats: &UserStats, joined: Option<NaiveDate>) -> MenuView {
        let joined = joined
            .map(|d| d.format("%d.%m.%Y").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let text = format!(
            "⚙️ SETTINGS\n\n\
             👤 YOUR PROFILE:\n• Name: {}\n• Member since: {}\n\n\
             🎯 YOUR STATISTICS:\n• Today: {}\n• All time: {}\n• Active days: {}\n\n\
             🔔 NOTIFICATIONS:\n• Status: {}\n",
            user.name,
            joined,
            stats.today_total,
            stats.overall_total,
            stats.active_days,
            if user.notifications { "✅ ON" } else { "❌ OFF" }
        );

        let mut keyboard = Keyboard::new();
        keyboard.row(vec![Button::new("✏️ CHANGE NAME", ButtonAction::ChangeName.encode())]);
        keyboard.row(vec![Button::new(
            format!("🔔 NOTIFICATIONS {}", if user.notifications { "✅" } else { "❌" }),
            ButtonAction::ToggleNotifications.encode(),
        )]);
        keyboard.row(vec![Button::new("🔄 RESET", ButtonAction::ResetMenu.encode())]);
        keyboard.row(back_to_menu_row());
        MenuView { text, keyboard }
    }

    fn reset_menu(&self) -> MenuView {
        let text = "🔄 RESET PROGRESS\n\n⚠️ WARNING: this cannot be undone!\n\nPick what to reset:"
            .to_string();

        let mut keyboard = Keyboard::new();
        keyboard.row(vec![Button::new("🗑️ TODAY ONLY", ButtonAction::ResetToday.encode())]);
        keyboard.row(vec![Button::new("🗑️ THIS WEEK", ButtonAction::ResetWeek.encode())]);
        keyboard.row(vec![Button::new("🗑️ ALL PROGRESS", ButtonAction::ResetAll.encode())]);
        keyboard.row(vec![Button::new("🗑️ DELETE PROFILE", ButtonAction::DeleteProfile.encode())]);
        keyboard.row(cancel_row());
        MenuView { text, keyboard }
    }

    fn week_stats(&self, page: &WeekPage, page_index: i64, today: NaiveDate) -> MenuView {
        let week_end = page.week_start + Duration::days(6);
        let mut text = format!(
            "📊 HISTORY\n🗓️ {}\n\n▶️ WEEK {}-{} {} ◀️\n\n",
            page.week_start.format("%B %Y").to_string().to_uppercase(),
            page.week_start.day(),
            week_end.day(),
            week_end.format("%B").to_string().to_uppercase(),
        );

        const DAY_LABELS: [&str; 7] = ["MON", "TUE", "WED", "THU", "FRI", "SAT", "SUN"];
        for (label, day) in DAY_LABELS.iter().zip(&page.days) {
            let check = if day.percent >= 100 { " ✓" } else { "" };
            text.push_str(&format!(
                "{} {}: {} {}% ({}){}\n",
                label,
                day.date.day(),
                progress_bar(day.percent, false),
                day.percent,
                day.total,
                check
            ));
        }

        text.push_str(&format!(
            "\n📈 WEEK TOTAL: {}\n👥 ACTIVE DAYS: {}/7\n",
            page.week_total, page.active_days
        ));

        let mut keyboard = Keyboard::new();
        let day_buttons = page
            .days
            .iter()
            .map(|day| {
                // Future days without data are inert.
                let action = if day.date <= today || day.total > 0 {
                    ButtonAction::StatsDay(day.date).encode()
                } else {
                    ButtonAction::Noop.encode()
                };
                Button::new(day.date.day().to_string(), action)
            })
            .collect();
        keyboard.row(day_buttons);

        let mut nav = Vec::new();
        if page_index > 0 {
            nav.push(Button::new("◀️ PREV WEEK", ButtonAction::StatisticsPrev.encode()));
            nav.push(Button::new("TODAY", ButtonAction::StatisticsToday.encode()));
        } else {
            nav.push(Button::new(
                format!("[{}/{}]", page_index + 1, crate::engine::STATS_PAGE_COUNT),
                ButtonAction::Noop.encode(),
            ));
        }
        if page_index < crate::engine::STATS_PAGE_COUNT - 1 {
            nav.push(Button::new("NEXT WEEK ▶️", ButtonAction::StatisticsNext.encode()));
        }
        keyboard.row(nav);
        keyboard.row(back_to_menu_row());

        MenuView { text, keyboard }
    }

    fn day_stats(&self, detail: &DayDetail) -> MenuView {
        let mut text = format!(
            "📊 DAY DETAIL\n🗓️ {}\n\n",
            detail.date.format("%-d %B %Y")
        );

        if detail.goals.is_empty() {
            text.push_str("No data for this day.");
        } else {
            for section in &detail.goals {
                text.push_str(&format!("🎯 {}:\n", section.name));
                for entry in &section.entries {
                    let check = if entry.percent >= 100 { " ✓" } else { "" };
                    text.push_str(&format!(
                        "• {}: {}/{} ({}%){}\n",
                        entry.user_name, entry.value, section.target, entry.percent, check
                    ));
                }
                let check = if section.completed { " ✓" } else { "" };
                text.push_str(&format!(
                    "═ TOTAL: {}/{} ({}%){}\n\n",
                    section.goal_total, section.goal_target_total, section.goal_percent, check
                ));
            }

            text.push_str(&format!(
                "📊 DAY SUMMARY:\n\
                 • Overall: {}/{} ({}%)\n\
                 • Members: {}/{}\n\
                 • Goals completed: {}/{}\n",
                detail.total_value,
                detail.total_target,
                detail.total_percent,
                detail.active_members,
                detail.total_members,
                detail.completed_goals,
                detail.goals.len()
            ));
            if detail.total_percent >= 100 {
                text.push_str("\n🏆 GREAT DAY! Every goal completed!\n");
            }
        }

        let mut keyboard = Keyboard::new();
        keyboard.row(vec![Button::new("◀️ BACK", ButtonAction::StatisticsBack.encode())]);
        keyboard.row(back_to_menu_row());
        MenuView { text, keyboard }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_fill() {
        assert_eq!(progress_bar(0, false), "▱▱▱▱▱▱▱▱▱▱");
        assert_eq!(progress_bar(50, false), "▰▰▰▰▰▱▱▱▱▱");
        assert_eq!(progress_bar(100, true), "██████████");
        // Floors partial cells.
        assert_eq!(progress_bar(59, false), "▰▰▰▰▰▱▱▱▱▱");
        // Out-of-range inputs are clamped.
        assert_eq!(progress_bar(150, false), "▰▰▰▰▰▰▰▰▰▰");
        assert_eq!(progress_bar(-10, false), "▱▱▱▱▱▱▱▱▱▱");
    }

    #[test]
    fn test_violation_line_echoes_length() {
        let error = InputError {
            input: "x".repeat(25),
            violation: ValidationError::NameLength { actual: 25 },
        };
        let line = violation_line(&error);
        assert!(line.contains("1 to 20"));
        assert!(line.contains("(25 characters)"));
    }

    #[test]
    fn test_main_menu_keyboard_depends_on_registration() {
        let renderer = TextMenuRenderer;
        let snapshot = MenuSnapshot {
            today: "2024-03-11".parse().unwrap(),
            users: vec![],
            goals: vec![],
            activities: vec![],
        };

        let registered = renderer.main_menu(&snapshot, true);
        let actions: Vec<_> = registered
            .keyboard
            .rows
            .iter()
            .flatten()
            .map(|b| b.action.as_str())
            .collect();
        assert!(actions.contains(&"add_goal"));
        assert!(actions.contains(&"mark_progress"));
        // No goals: no delete button.
        assert!(!actions.contains(&"delete_goal"));

        let unregistered = renderer.main_menu(&snapshot, false);
        let actions: Vec<_> = unregistered
            .keyboard
            .rows
            .iter()
            .flatten()
            .map(|b| b.action.as_str())
            .collect();
        assert_eq!(actions, vec!["create_profile", "help"]);
    }

    #[test]
    fn test_week_stats_day_buttons() {
        let renderer = TextMenuRenderer;
        let week_start: NaiveDate = "2024-03-11".parse().unwrap();
        let days = (0..7)
            .map(|i| crate::stats::DayTotal {
                date: week_start + Duration::days(i),
                total: if i == 0 { 10 } else { 0 },
                participants: if i == 0 { 1 } else { 0 },
                percent: if i == 0 { 50 } else { 0 },
            })
            .collect();
        let page = WeekPage {
            week_start,
            days,
            max_possible_per_day: 20,
            week_total: 10,
            active_days: 1,
        };

        // "Today" is Wednesday: Thursday onward must be inert.
        let today: NaiveDate = "2024-03-13".parse().unwrap();
        let view = renderer.week_stats(&page, 0, today);
        let day_row = &view.keyboard.rows[0];
        assert_eq!(day_row.len(), 7);
        assert_eq!(day_row[0].action, "stats_day_2024-03-11");
        assert_eq!(day_row[2].action, "stats_day_2024-03-13");
        assert_eq!(day_row[3].action, "noop");

        // Page 0 has no prev/today buttons.
        let nav: Vec<_> = view.keyboard.rows[1].iter().map(|b| b.action.as_str()).collect();
        assert!(!nav.contains(&"statistics_prev"));
        assert!(nav.contains(&"statistics_next"));

        // Older pages gain prev/today and lose next at the cap.
        let view = renderer.week_stats(&page, 3, today);
        let nav: Vec<_> = view.keyboard.rows[1].iter().map(|b| b.action.as_str()).collect();
        assert!(nav.contains(&"statistics_prev"));
        assert!(nav.contains(&"statistics_today"));
        assert!(!nav.contains(&"statistics_next"));
    }
}
