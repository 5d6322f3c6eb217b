//! Read-side aggregation over progress rows.
//!
//! Every computation takes its dates explicitly; "today" and week
//! boundaries are decided by the caller from the injected clock and the
//! configured timezone offset.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use database::{activity, goal, progress, user, Database, Goal, RecentActivity, User};

use crate::error::EngineError;

/// Share of `target` covered by `value`, as a whole percentage.
///
/// Clamp-and-floor: never rounds, never exceeds 100, and is 0 whenever the
/// target is not positive. Every progress bar in the system goes through
/// this one function.
pub fn percent(value: i64, target: i64) -> i64 {
    if target <= 0 {
        return 0;
    }
    (100 * value / target).min(100)
}

/// Everything the main menu shows for one chat.
#[derive(Debug, Clone)]
pub struct MenuSnapshot {
    pub today: NaiveDate,
    pub users: Vec<User>,
    pub goals: Vec<GoalBoard>,
    pub activities: Vec<RecentActivity>,
}

/// One goal's block on the main menu.
#[derive(Debug, Clone)]
pub struct GoalBoard {
    pub goal: Goal,
    /// Sum of today's values across all active users.
    pub total_today: i64,
    /// Group completion against target x member count.
    pub group_percent: i64,
    pub lines: Vec<UserProgressLine>,
}

/// One member's line under a goal.
#[derive(Debug, Clone)]
pub struct UserProgressLine {
    pub name: String,
    pub value: i64,
    pub percent: i64,
}

/// One week of a chat's history.
#[derive(Debug, Clone)]
pub struct WeekPage {
    pub week_start: NaiveDate,
    /// Exactly 7 entries, Monday first.
    pub days: Vec<DayTotal>,
    /// Sum over active goals of target x active member count.
    pub max_possible_per_day: i64,
    pub week_total: i64,
    /// Days with any progress.
    pub active_days: usize,
}

/// One day's totals within a week page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayTotal {
    pub date: NaiveDate,
    pub total: i64,
    pub participants: i64,
    /// Against [`WeekPage::max_possible_per_day`].
    pub percent: i64,
}

/// The full per-goal, per-member breakdown for one day.
#[derive(Debug, Clone)]
pub struct DayDetail {
    pub date: NaiveDate,
    pub goals: Vec<DayGoal>,
    pub total_value: i64,
    pub total_target: i64,
    pub total_percent: i64,
    /// Members with any contribution that day.
    pub active_members: usize,
    pub total_members: usize,
    pub completed_goals: usize,
}

/// One goal's section of the day detail.
#[derive(Debug, Clone)]
pub struct DayGoal {
    pub goal_id: i64,
    pub name: String,
    /// Per-member target.
    pub target: i64,
    pub entries: Vec<DayEntry>,
    pub goal_total: i64,
    /// target x member count.
    pub goal_target_total: i64,
    pub goal_percent: i64,
    /// Every member reached 100% and contributed something.
    pub completed: bool,
}

/// One member's cell in a day goal section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayEntry {
    pub user_name: String,
    pub value: i64,
    pub percent: i64,
}

/// Per-member lifetime statistics for the settings view.
pub type UserStats = progress::UserTotals;

/// Pure read-side computations over the store's progress data.
#[derive(Debug, Clone)]
pub struct ProgressAggregator {
    db: Database,
}

impl ProgressAggregator {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// A member's accumulated value for one goal on one date.
    pub async fn day_progress(
        &self,
        user_id: i64,
        goal_id: i64,
        date: NaiveDate,
    ) -> Result<i64, EngineError> {
        let value =
            progress::day_value(self.db.pool(), user_id, goal_id, &date.to_string()).await?;
        Ok(value)
    }

    /// Atomically add to a member's value for one goal on one date and
    /// return the new total.
    pub async fn add_progress(
        &self,
        user_id: i64,
        goal_id: i64,
        date: NaiveDate,
        amount: i64,
    ) -> Result<i64, EngineError> {
        let value =
            progress::add_to_progress(self.db.pool(), user_id, goal_id, &date.to_string(), amount)
                .await?;
        Ok(value)
    }

    /// Build the main menu's data for one chat.
    pub async fn menu_snapshot(
        &self,
        chat_id: i64,
        today: NaiveDate,
        recent_limit: i64,
    ) -> Result<MenuSnapshot, EngineError> {
        let users = user::list_active_users(self.db.pool()).await?;
        let goals = goal::list_active_goals(self.db.pool(), chat_id).await?;
        let activities = activity::recent_activities(self.db.pool(), chat_id, recent_limit).await?;

        let mut boards = Vec::with_capacity(goals.len());
        for goal in goals {
            let mut lines = Vec::with_capacity(users.len());
            let mut total_today = 0;
            for user in &users {
                let value = self
                    .day_progress(user.user_id, goal.goal_id, today)
                    .await?;
                total_today += value;
                lines.push(UserProgressLine {
                    name: user.name.clone(),
                    value,
                    percent: percent(value, goal.target),
                });
            }
            let group_percent = percent(total_today, goal.target * users.len() as i64);
            boards.push(GoalBoard {
                goal,
                total_today,
                group_percent,
                lines,
            });
        }

        Ok(MenuSnapshot {
            today,
            users,
            goals: boards,
            activities,
        })
    }

    /// Aggregate the 7 days starting at `week_start` (a Monday).
    ///
    /// Day totals include rows from since-deleted goals (history is
    /// preserved); the max-possible denominator counts only active goals and
    /// active members.
    pub async fn week_page(&self, chat_id: i64, week_start: NaiveDate) -> Result<WeekPage, EngineError> {
        let week_end = week_start + Duration::days(6);
        let rows = progress::week_rows(
            self.db.pool(),
            chat_id,
            &week_start.to_string(),
            &week_end.to_string(),
        )
        .await?;
        let by_date: HashMap<String, (i64, i64)> = rows
            .into_iter()
            .map(|row| (row.date, (row.total, row.participants)))
            .collect();

        let member_count = user::list_active_users(self.db.pool()).await?.len() as i64;
        let max_possible_per_day: i64 = goal::list_active_goals(self.db.pool(), chat_id)
            .await?
            .iter()
            .map(|g| g.target * member_count)
            .sum();

        let mut days = Vec::with_capacity(7);
        let mut week_total = 0;
        let mut active_days = 0;
        for offset in 0..7 {
            let date = week_start + Duration::days(offset);
            let (total, participants) = by_date.get(&date.to_string()).copied().unwrap_or((0, 0));
            week_total += total;
            if total > 0 {
                active_days += 1;
            }
            days.push(DayTotal {
                date,
                total,
                participants,
                percent: percent(total, max_possible_per_day),
            });
        }

        Ok(WeekPage {
            week_start,
            days,
            max_possible_per_day,
            week_total,
            active_days,
        })
    }

    /// The active-goal x active-member cross join for one date, including
    /// zero rows for members who contributed nothing.
    pub async fn day_detail(&self, chat_id: i64, date: NaiveDate) -> Result<DayDetail, EngineError> {
        let rows = progress::day_rows(self.db.pool(), chat_id, &date.to_string()).await?;

        let mut goals: Vec<DayGoal> = Vec::new();
        let mut members: Vec<i64> = Vec::new();
        let mut active: Vec<i64> = Vec::new();
        let mut total_value = 0;
        let mut total_target = 0;

        for row in rows {
            if !members.contains(&row.user_id) {
                members.push(row.user_id);
            }
            if row.value > 0 && !active.contains(&row.user_id) {
                active.push(row.user_id);
            }
            total_value += row.value;
            total_target += row.target;

            let entry = DayEntry {
                user_name: row.user_name,
                value: row.value,
                percent: percent(row.value, row.target),
            };
            match goals.iter_mut().find(|g| g.goal_id == row.goal_id) {
                Some(section) => section.entries.push(entry),
                None => goals.push(DayGoal {
                    goal_id: row.goal_id,
                    name: row.goal_name,
                    target: row.target,
                    entries: vec![entry],
                    goal_total: 0,
                    goal_target_total: 0,
                    goal_percent: 0,
                    completed: false,
                }),
            }
        }

        let mut completed_goals = 0;
        for section in &mut goals {
            section.goal_total = section.entries.iter().map(|e| e.value).sum();
            section.goal_target_total = section.target * section.entries.len() as i64;
            section.goal_percent = percent(section.goal_total, section.goal_target_total);
            section.completed =
                section.goal_total > 0 && section.entries.iter().all(|e| e.percent >= 100);
            if section.completed {
                completed_goals += 1;
            }
        }

        Ok(DayDetail {
            date,
            total_percent: percent(total_value, total_target),
            total_value,
            total_target,
            active_members: active.len(),
            total_members: members.len(),
            completed_goals,
            goals,
        })
    }

    /// Lifetime totals for one member.
    pub async fn user_stats(&self, user_id: i64, today: NaiveDate) -> Result<UserStats, EngineError> {
        let totals =
            progress::user_totals(self.db.pool(), user_id, &today.to_string()).await?;
        Ok(totals)
    }
}
