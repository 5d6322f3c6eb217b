//! The conversation engine: dialog state machine + display refresh.

use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate};
use database::validation::{
    parse_goal_target, parse_progress_amount, validate_goal_name, validate_user_name,
};
use database::{activity, goal, menu, scratch, user, Database, DatabaseError, GoalKind};
use tracing::{info, warn};

use crate::actions::ButtonAction;
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::render::{GoalPickerRow, InputError, MenuRenderer, MenuView, TextMenuRenderer};
use crate::session::SessionManager;
use crate::state::DialogState;
use crate::stats::ProgressAggregator;
use crate::transport::Transport;

/// Help text shown from the menu's help button.
pub const HELP_TEXT: &str = "🏋️ BOT HELP\n\n\
What the buttons do:\n\
• 👤 CREATE PROFILE - join the group\n\
• ➕ ADD GOAL - create a shared goal\n\
• ✅ LOG PROGRESS - record what you did today\n\
• 📊 STATISTICS - browse the group's history\n\
• ⚙️ SETTINGS - rename, notifications, resets\n\n\
How it works:\n\
1. Send /start in the chat\n\
2. Create a profile\n\
3. Add goals for the group\n\
4. Log your progress every day\n\n\
The menu is a single message the bot keeps editing in place.";

/// How many week pages the statistics view can page back through.
pub const STATS_PAGE_COUNT: i64 = 4;

/// Scratch key holding a member's current statistics page.
const STATS_PAGE_KEY: &str = "stats_page";

const NOTICE_WAIT: &str = "⏳ Please wait!";
const NOTICE_PROFILE_REQUIRED: &str = "⚠️ Create a profile first!";
const NOTICE_ALREADY_REGISTERED: &str = "ℹ️ You already have a profile!";
const NOTICE_PROFILE_NOT_FOUND: &str = "⚠️ Profile not found!";
const NOTICE_NO_GOALS: &str = "⚠️ No active goals!";
const NOTICE_GOAL_NOT_FOUND: &str = "⚠️ Goal not found!";
const NOTICE_SESSION_EXPIRED: &str = "⚠️ That dialog has expired!";

/// Result of feeding one inbound event to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// The event advanced a dialog, completed a step, or refreshed a view.
    Handled,
    /// The event was not addressed to the engine (command text, unknown
    /// callback, idle chat).
    Ignored,
    /// Another member's dialog is in flight; the caller was told to wait.
    Conflict,
}

/// The conversation engine.
///
/// Drives the multi-step dialog state machine on top of the session
/// manager, commits terminal steps to the store, and keeps the chat's
/// single pinned menu message current. Side effects are strictly ordered:
/// validate, commit, clear or advance the session, log the activity, then
/// refresh the display.
pub struct ConversationEngine<T: Transport> {
    db: Database,
    sessions: SessionManager,
    aggregator: ProgressAggregator,
    renderer: Box<dyn MenuRenderer>,
    transport: T,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl<T: Transport> ConversationEngine<T> {
    /// Create an engine with the default text renderer.
    pub fn new(db: Database, transport: T, clock: Arc<dyn Clock>, config: EngineConfig) -> Self {
        Self {
            sessions: SessionManager::new(db.clone(), clock.clone()),
            aggregator: ProgressAggregator::new(db.clone()),
            renderer: Box::new(TextMenuRenderer),
            db,
            transport,
            clock,
            config,
        }
    }

    /// Replace the menu renderer.
    pub fn with_renderer(mut self, renderer: Box<dyn MenuRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Get the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Today's calendar date in the configured timezone.
    fn today(&self) -> NaiveDate {
        self.clock
            .now()
            .with_timezone(&self.config.utc_offset)
            .date_naive()
    }

    /// Monday of the week containing `date`.
    fn week_start(date: NaiveDate) -> NaiveDate {
        date - Duration::days(date.weekday().num_days_from_monday() as i64)
    }

    /// Handle the `/start` command: refresh the menu for this viewer.
    ///
    /// `command_message_id` is the triggering command message, deleted
    /// best-effort to keep the chat clean.
    pub async fn open_menu(
        &self,
        chat_id: i64,
        user_id: i64,
        command_message_id: Option<i64>,
    ) -> Result<(), EngineError> {
        let _guard = self.sessions.guard(chat_id).await;

        self.delete_best_effort(chat_id, command_message_id).await;
        self.refresh_menu(chat_id, user_id).await?;
        self.log(chat_id, user_id, "start", "opened the menu").await?;
        Ok(())
    }

    /// Handle an inbound text message.
    ///
    /// `message_id` is the member's own message, deleted best-effort (the
    /// menu is the only surface the bot keeps in the chat).
    pub async fn handle_text(
        &self,
        chat_id: i64,
        user_id: i64,
        message_id: Option<i64>,
        text: &str,
    ) -> Result<EventOutcome, EngineError> {
        let _guard = self.sessions.guard(chat_id).await;

        self.delete_best_effort(chat_id, message_id).await;

        let text = text.trim();
        // Commands belong to the outer dispatcher, never the dialog FSM.
        if text.is_empty() || text.starts_with('/') {
            return Ok(EventOutcome::Ignored);
        }

        let Some(session) = self.sessions.get(chat_id).await? else {
            return Ok(EventOutcome::Ignored);
        };
        if session.user_id != user_id {
            self.notify(user_id, NOTICE_WAIT).await;
            return Ok(EventOutcome::Conflict);
        }

        match session.state {
            DialogState::WaitingForName => self.text_register(chat_id, user_id, text).await,
            DialogState::WaitingForNewName => self.text_rename(chat_id, user_id, text).await,
            DialogState::WaitingForGoalName => self.text_goal_name(chat_id, user_id, text).await,
            DialogState::WaitingForGoalTarget { goal_name } => {
                self.text_goal_target(chat_id, user_id, &goal_name, text).await
            }
            DialogState::WaitingForGoalType { .. } => {
                // This state only advances via the type buttons.
                Ok(EventOutcome::Ignored)
            }
            DialogState::WaitingForCompleteNumber { goal_id, goal_name } => {
                self.text_progress(chat_id, user_id, goal_id, &goal_name, text).await
            }
        }
    }

    /// Handle an inline keyboard press.
    pub async fn handle_button(
        &self,
        chat_id: i64,
        user_id: i64,
        data: &str,
    ) -> Result<EventOutcome, EngineError> {
        let _guard = self.sessions.guard(chat_id).await;

        let Some(action) = ButtonAction::decode(data) else {
            return Ok(EventOutcome::Ignored);
        };

        let session = self.sessions.get(chat_id).await?;
        if let Some(ref live) = session {
            if live.user_id != user_id {
                self.notify(user_id, NOTICE_WAIT).await;
                return Ok(EventOutcome::Conflict);
            }
        }

        match action {
            ButtonAction::CreateProfile => self.button_create_profile(chat_id, user_id).await,
            ButtonAction::AddGoal => self.button_add_goal(chat_id, user_id).await,
            ButtonAction::MarkProgress => self.button_mark_progress(chat_id, user_id).await,
            ButtonAction::SelectGoal(goal_id) => {
                self.button_select_goal(chat_id, user_id, goal_id).await
            }
            ButtonAction::GoalTypeDaily => {
                self.button_goal_type(chat_id, user_id, GoalKind::Daily).await
            }
            ButtonAction::GoalTypeMonthly => {
                self.button_goal_type(chat_id, user_id, GoalKind::Monthly).await
            }
            ButtonAction::Statistics => {
                if !self.require_registered(user_id).await? {
                    return Ok(EventOutcome::Handled);
                }
                self.set_stats_page(user_id, 0).await?;
                self.show_week(chat_id, 0).await?;
                Ok(EventOutcome::Handled)
            }
            ButtonAction::StatisticsPrev => {
                let page = self.stats_page(user_id).await?;
                if page > 0 {
                    self.set_stats_page(user_id, page - 1).await?;
                    self.show_week(chat_id, page - 1).await?;
                }
                Ok(EventOutcome::Handled)
            }
            ButtonAction::StatisticsNext => {
                let page = self.stats_page(user_id).await?;
                if page < STATS_PAGE_COUNT - 1 {
                    self.set_stats_page(user_id, page + 1).await?;
                    self.show_week(chat_id, page + 1).await?;
                }
                Ok(EventOutcome::Handled)
            }
            ButtonAction::StatisticsToday => {
                self.set_stats_page(user_id, 0).await?;
                self.show_week(chat_id, 0).await?;
                Ok(EventOutcome::Handled)
            }
            ButtonAction::StatisticsBack => {
                let page = self.stats_page(user_id).await?;
                self.show_week(chat_id, page).await?;
                Ok(EventOutcome::Handled)
            }
            ButtonAction::StatsDay(date) => {
                self.show_day(chat_id, date).await?;
                Ok(EventOutcome::Handled)
            }
            ButtonAction::Settings => {
                if !self.require_registered(user_id).await? {
                    return Ok(EventOutcome::Handled);
                }
                self.show_settings(chat_id, user_id).await?;
                Ok(EventOutcome::Handled)
            }
            ButtonAction::ChangeName => {
                if !self.require_registered(user_id).await? {
                    return Ok(EventOutcome::Handled);
                }
                self.sessions
                    .start(chat_id, user_id, DialogState::WaitingForNewName)
                    .await?;
                self.ensure_menu(chat_id, self.renderer.rename_prompt(None)).await?;
                Ok(EventOutcome::Handled)
            }
            ButtonAction::ToggleNotifications => {
                self.button_toggle_notifications(chat_id, user_id).await
            }
            ButtonAction::ResetMenu => {
                self.ensure_menu(chat_id, self.renderer.reset_menu()).await?;
                Ok(EventOutcome::Handled)
            }
            ButtonAction::ResetToday => {
                let today = self.today();
                database::progress::reset_on_date(self.db.pool(), user_id, &today.to_string())
                    .await?;
                self.notify(user_id, "✅ Today's progress was reset").await;
                self.refresh_menu(chat_id, user_id).await?;
                Ok(EventOutcome::Handled)
            }
            ButtonAction::ResetWeek => {
                let monday = Self::week_start(self.today());
                database::progress::reset_since(self.db.pool(), user_id, &monday.to_string())
                    .await?;
                self.notify(user_id, "✅ This week's progress was reset").await;
                self.refresh_menu(chat_id, user_id).await?;
                Ok(EventOutcome::Handled)
            }
            ButtonAction::ResetAll => {
                database::progress::reset_all(self.db.pool(), user_id).await?;
                self.notify(user_id, "✅ All your progress was reset").await;
                self.refresh_menu(chat_id, user_id).await?;
                Ok(EventOutcome::Handled)
            }
            ButtonAction::DeleteProfile => {
                user::deactivate_user(self.db.pool(), user_id).await?;
                self.notify(user_id, "✅ Your profile was deleted").await;
                self.refresh_menu(chat_id, user_id).await?;
                Ok(EventOutcome::Handled)
            }
            ButtonAction::DeleteGoal => self.button_delete_goal(chat_id, user_id).await,
            ButtonAction::ConfirmDelete(goal_id) => {
                self.button_confirm_delete(chat_id, user_id, goal_id).await
            }
            ButtonAction::ExecuteDelete(goal_id) => {
                self.button_execute_delete(chat_id, user_id, goal_id).await
            }
            ButtonAction::Help => {
                self.ensure_menu(chat_id, self.renderer.help()).await?;
                Ok(EventOutcome::Handled)
            }
            ButtonAction::Cancel => {
                // Unconditional: dialog and scratch both go.
                self.sessions.clear(chat_id).await?;
                scratch::clear(self.db.pool(), user_id).await?;
                self.refresh_menu(chat_id, user_id).await?;
                Ok(EventOutcome::Handled)
            }
            ButtonAction::MainMenu => {
                scratch::clear(self.db.pool(), user_id).await?;
                self.refresh_menu(chat_id, user_id).await?;
                Ok(EventOutcome::Handled)
            }
            ButtonAction::Noop => Ok(EventOutcome::Ignored),
        }
    }

    // ----- text input steps -----

    async fn text_register(
        &self,
        chat_id: i64,
        user_id: i64,
        text: &str,
    ) -> Result<EventOutcome, EngineError> {
        if let Err(violation) = validate_user_name(text) {
            // The session stays live and its TTL clock keeps running.
            let error = InputError { input: text.to_string(), violation };
            self.ensure_menu(chat_id, self.renderer.register_prompt(Some(&error))).await?;
            return Ok(EventOutcome::Handled);
        }

        match user::create_user(self.db.pool(), user_id, text, &self.clock.now().to_rfc3339()).await
        {
            Ok(()) => {}
            Err(DatabaseError::AlreadyExists { .. }) => {
                self.sessions.clear(chat_id).await?;
                self.notify(user_id, NOTICE_ALREADY_REGISTERED).await;
                self.refresh_menu(chat_id, user_id).await?;
                return Ok(EventOutcome::Handled);
            }
            Err(e) => return Err(e.into()),
        }
        self.sessions.clear(chat_id).await?;
        self.log(chat_id, user_id, "register", "joined the group").await?;
        self.notify(user_id, &format!("✅ {} registered!", text)).await;
        self.refresh_menu(chat_id, user_id).await?;
        Ok(EventOutcome::Handled)
    }

    async fn text_rename(
        &self,
        chat_id: i64,
        user_id: i64,
        text: &str,
    ) -> Result<EventOutcome, EngineError> {
        if let Err(violation) = validate_user_name(text) {
            let error = InputError { input: text.to_string(), violation };
            self.ensure_menu(chat_id, self.renderer.rename_prompt(Some(&error))).await?;
            return Ok(EventOutcome::Handled);
        }

        let old_name = match user::get_user(self.db.pool(), user_id).await {
            Ok(user) => user.name,
            Err(DatabaseError::NotFound { .. }) => {
                // Deleted mid-dialog.
                self.sessions.clear(chat_id).await?;
                self.notify(user_id, NOTICE_PROFILE_NOT_FOUND).await;
                self.refresh_menu(chat_id, user_id).await?;
                return Ok(EventOutcome::Handled);
            }
            Err(e) => return Err(e.into()),
        };

        user::rename_user(self.db.pool(), user_id, text).await?;
        self.sessions.clear(chat_id).await?;
        self.log(
            chat_id,
            user_id,
            "update_name",
            &format!("renamed {} to {}", old_name, text),
        )
        .await?;
        self.notify(user_id, &format!("✅ Name changed to '{}'", text)).await;
        self.refresh_menu(chat_id, user_id).await?;
        Ok(EventOutcome::Handled)
    }

    async fn text_goal_name(
        &self,
        chat_id: i64,
        user_id: i64,
        text: &str,
    ) -> Result<EventOutcome, EngineError> {
        if let Err(violation) = validate_goal_name(text) {
            let error = InputError { input: text.to_string(), violation };
            self.ensure_menu(chat_id, self.renderer.goal_name_prompt(Some(&error))).await?;
            return Ok(EventOutcome::Handled);
        }

        self.sessions
            .start(
                chat_id,
                user_id,
                DialogState::WaitingForGoalTarget { goal_name: text.to_string() },
            )
            .await?;
        self.ensure_menu(chat_id, self.renderer.goal_target_prompt(text, None)).await?;
        Ok(EventOutcome::Handled)
    }

    async fn text_goal_target(
        &self,
        chat_id: i64,
        user_id: i64,
        goal_name: &str,
        text: &str,
    ) -> Result<EventOutcome, EngineError> {
        let target = match parse_goal_target(text) {
            Ok(target) => target,
            Err(violation) => {
                let error = InputError { input: text.to_string(), violation };
                self.ensure_menu(chat_id, self.renderer.goal_target_prompt(goal_name, Some(&error)))
                    .await?;
                return Ok(EventOutcome::Handled);
            }
        };

        self.sessions
            .start(
                chat_id,
                user_id,
                DialogState::WaitingForGoalType {
                    goal_name: goal_name.to_string(),
                    goal_target: target,
                },
            )
            .await?;
        self.ensure_menu(chat_id, self.renderer.goal_type_prompt(goal_name, target)).await?;
        Ok(EventOutcome::Handled)
    }

    async fn text_progress(
        &self,
        chat_id: i64,
        user_id: i64,
        goal_id: i64,
        goal_name: &str,
        text: &str,
    ) -> Result<EventOutcome, EngineError> {
        let amount = match parse_progress_amount(text) {
            Ok(amount) => amount,
            Err(violation) => {
                let error = InputError { input: text.to_string(), violation };
                self.ensure_menu(
                    chat_id,
                    self.renderer.progress_prompt(goal_name, None, Some(&error)),
                )
                .await?;
                return Ok(EventOutcome::Handled);
            }
        };

        // The goal may have been deleted between selection and submission.
        let goal = goal::get_goal(self.db.pool(), goal_id).await?;
        if !goal.map(|g| g.is_active).unwrap_or(false) {
            self.sessions.clear(chat_id).await?;
            self.notify(user_id, NOTICE_GOAL_NOT_FOUND).await;
            self.refresh_menu(chat_id, user_id).await?;
            return Ok(EventOutcome::Handled);
        }

        let new_total = self
            .aggregator
            .add_progress(user_id, goal_id, self.today(), amount)
            .await?;
        self.sessions.clear(chat_id).await?;
        self.log(chat_id, user_id, "progress", &format!("+{} {}", amount, goal_name)).await?;
        info!(
            "Progress for user {} on goal {}: +{} (total {})",
            user_id, goal_id, amount, new_total
        );
        self.notify(user_id, &format!("✅ +{} {} logged!", amount, goal_name)).await;
        self.refresh_menu(chat_id, user_id).await?;
        Ok(EventOutcome::Handled)
    }

    // ----- button steps -----

    async fn button_create_profile(
        &self,
        chat_id: i64,
        user_id: i64,
    ) -> Result<EventOutcome, EngineError> {
        if user::is_registered(self.db.pool(), user_id).await? {
            self.notify(user_id, NOTICE_ALREADY_REGISTERED).await;
            return Ok(EventOutcome::Handled);
        }

        self.sessions.start(chat_id, user_id, DialogState::WaitingForName).await?;
        self.ensure_menu(chat_id, self.renderer.register_prompt(None)).await?;
        Ok(EventOutcome::Handled)
    }

    async fn button_add_goal(
        &self,
        chat_id: i64,
        user_id: i64,
    ) -> Result<EventOutcome, EngineError> {
        if !self.require_registered(user_id).await? {
            return Ok(EventOutcome::Handled);
        }

        self.sessions.start(chat_id, user_id, DialogState::WaitingForGoalName).await?;
        self.ensure_menu(chat_id, self.renderer.goal_name_prompt(None)).await?;
        Ok(EventOutcome::Handled)
    }

    async fn button_mark_progress(
        &self,
        chat_id: i64,
        user_id: i64,
    ) -> Result<EventOutcome, EngineError> {
        if !self.require_registered(user_id).await? {
            return Ok(EventOutcome::Handled);
        }

        let goals = goal::list_active_goals(self.db.pool(), chat_id).await?;
        if goals.is_empty() {
            self.notify(user_id, NOTICE_NO_GOALS).await;
            return Ok(EventOutcome::Handled);
        }

        let today = self.today();
        let mut rows = Vec::with_capacity(goals.len());
        for goal in goals {
            let today_value = self.aggregator.day_progress(user_id, goal.goal_id, today).await?;
            rows.push(GoalPickerRow { goal, today_value });
        }
        self.ensure_menu(chat_id, self.renderer.goal_picker(&rows)).await?;
        Ok(EventOutcome::Handled)
    }

    async fn button_select_goal(
        &self,
        chat_id: i64,
        user_id: i64,
        goal_id: i64,
    ) -> Result<EventOutcome, EngineError> {
        let goal = match goal::get_goal(self.db.pool(), goal_id).await? {
            Some(goal) if goal.is_active => goal,
            _ => {
                self.notify(user_id, NOTICE_GOAL_NOT_FOUND).await;
                return self.button_mark_progress(chat_id, user_id).await;
            }
        };

        let current = self.aggregator.day_progress(user_id, goal_id, self.today()).await?;
        self.sessions
            .start(
                chat_id,
                user_id,
                DialogState::WaitingForCompleteNumber {
                    goal_id,
                    goal_name: goal.name.clone(),
                },
            )
            .await?;
        self.ensure_menu(
            chat_id,
            self.renderer.progress_prompt(&goal.name, Some((current, goal.target)), None),
        )
        .await?;
        Ok(EventOutcome::Handled)
    }

    async fn button_goal_type(
        &self,
        chat_id: i64,
        user_id: i64,
        kind: GoalKind,
    ) -> Result<EventOutcome, EngineError> {
        // The terminal step re-reads the session: if it expired (or its
        // payload is gone) we fall back to the menu instead of acting on
        // partial data.
        let session = self.sessions.get(chat_id).await?;
        let Some(crate::session::Session {
            state: DialogState::WaitingForGoalType { goal_name, goal_target },
            ..
        }) = session
        else {
            self.notify(user_id, NOTICE_SESSION_EXPIRED).await;
            self.refresh_menu(chat_id, user_id).await?;
            return Ok(EventOutcome::Handled);
        };

        goal::create_goal(
            self.db.pool(),
            chat_id,
            &goal_name,
            goal_target,
            kind,
            user_id,
            &self.clock.now().to_rfc3339(),
        )
        .await?;
        self.sessions.clear(chat_id).await?;
        self.log(chat_id, user_id, "create_goal", &format!("created goal {}", goal_name))
            .await?;
        self.refresh_menu(chat_id, user_id).await?;
        self.notify(user_id, &format!("✅ Goal '{}' added", goal_name)).await;
        Ok(EventOutcome::Handled)
    }

    async fn button_toggle_notifications(
        &self,
        chat_id: i64,
        user_id: i64,
    ) -> Result<EventOutcome, EngineError> {
        let enabled = match user::toggle_notifications(self.db.pool(), user_id).await {
            Ok(enabled) => enabled,
            Err(DatabaseError::NotFound { .. }) => {
                self.notify(user_id, NOTICE_PROFILE_NOT_FOUND).await;
                return Ok(EventOutcome::Handled);
            }
            Err(e) => return Err(e.into()),
        };
        self.notify(
            user_id,
            if enabled { "✅ Notifications enabled" } else { "✅ Notifications disabled" },
        )
        .await;
        // Re-render settings directly; no synthetic inbound event.
        self.show_settings(chat_id, user_id).await?;
        Ok(EventOutcome::Handled)
    }

    async fn button_delete_goal(
        &self,
        chat_id: i64,
        user_id: i64,
    ) -> Result<EventOutcome, EngineError> {
        let goals = goal::list_active_goals(self.db.pool(), chat_id).await?;
        if goals.is_empty() {
            self.notify(user_id, NOTICE_NO_GOALS).await;
            return Ok(EventOutcome::Handled);
        }
        self.ensure_menu(chat_id, self.renderer.delete_picker(&goals)).await?;
        Ok(EventOutcome::Handled)
    }

    async fn button_confirm_delete(
        &self,
        chat_id: i64,
        user_id: i64,
        goal_id: i64,
    ) -> Result<EventOutcome, EngineError> {
        let goal = match goal::get_goal(self.db.pool(), goal_id).await? {
            Some(goal) if goal.is_active => goal,
            _ => {
                self.notify(user_id, NOTICE_GOAL_NOT_FOUND).await;
                return self.button_delete_goal(chat_id, user_id).await;
            }
        };
        self.ensure_menu(chat_id, self.renderer.confirm_delete(&goal)).await?;
        Ok(EventOutcome::Handled)
    }

    async fn button_execute_delete(
        &self,
        chat_id: i64,
        user_id: i64,
        goal_id: i64,
    ) -> Result<EventOutcome, EngineError> {
        let goal = match goal::get_goal(self.db.pool(), goal_id).await? {
            Some(goal) if goal.is_active => goal,
            _ => {
                self.notify(user_id, NOTICE_GOAL_NOT_FOUND).await;
                return self.button_delete_goal(chat_id, user_id).await;
            }
        };

        goal::deactivate_goal(self.db.pool(), goal_id).await?;
        self.log(chat_id, user_id, "delete_goal", &format!("deleted goal {}", goal.name))
            .await?;
        self.refresh_menu(chat_id, user_id).await?;
        self.notify(user_id, &format!("✅ Goal '{}' deleted", goal.name)).await;
        Ok(EventOutcome::Handled)
    }

    // ----- views -----

    async fn refresh_menu(&self, chat_id: i64, viewer_id: i64) -> Result<(), EngineError> {
        let snapshot = self
            .aggregator
            .menu_snapshot(chat_id, self.today(), self.config.recent_activities)
            .await?;
        let registered = user::is_registered(self.db.pool(), viewer_id).await?;
        let view = self.renderer.main_menu(&snapshot, registered);
        self.ensure_menu(chat_id, view).await
    }

    async fn show_settings(&self, chat_id: i64, user_id: i64) -> Result<(), EngineError> {
        let member = match user::get_user(self.db.pool(), user_id).await {
            Ok(member) => member,
            Err(DatabaseError::NotFound { .. }) => {
                self.notify(user_id, NOTICE_PROFILE_NOT_FOUND).await;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let stats = self.aggregator.user_stats(user_id, self.today()).await?;
        let joined = chrono::DateTime::parse_from_rfc3339(&member.joined_at)
            .ok()
            .map(|dt| dt.with_timezone(&self.config.utc_offset).date_naive());
        self.ensure_menu(chat_id, self.renderer.settings(&member, &stats, joined)).await
    }

    async fn show_week(&self, chat_id: i64, page: i64) -> Result<(), EngineError> {
        let today = self.today();
        let week_start = Self::week_start(today) - Duration::weeks(page);
        let week = self.aggregator.week_page(chat_id, week_start).await?;
        self.ensure_menu(chat_id, self.renderer.week_stats(&week, page, today)).await
    }

    async fn show_day(&self, chat_id: i64, date: NaiveDate) -> Result<(), EngineError> {
        let detail = self.aggregator.day_detail(chat_id, date).await?;
        self.ensure_menu(chat_id, self.renderer.day_stats(&detail)).await
    }

    // ----- plumbing -----

    async fn stats_page(&self, user_id: i64) -> Result<i64, EngineError> {
        let page = scratch::get_value(self.db.pool(), user_id, STATS_PAGE_KEY)
            .await?
            .and_then(|value| value.parse::<i64>().ok())
            .unwrap_or(0);
        Ok(page.clamp(0, STATS_PAGE_COUNT - 1))
    }

    async fn set_stats_page(&self, user_id: i64, page: i64) -> Result<(), EngineError> {
        scratch::set_value(self.db.pool(), user_id, STATS_PAGE_KEY, &page.to_string()).await?;
        Ok(())
    }

    async fn require_registered(&self, user_id: i64) -> Result<bool, EngineError> {
        let registered = user::is_registered(self.db.pool(), user_id).await?;
        if !registered {
            self.notify(user_id, NOTICE_PROFILE_REQUIRED).await;
        }
        Ok(registered)
    }

    /// Show a view as the chat's pinned menu, tracking the message id.
    ///
    /// Transport failures are logged and swallowed; the pointer is only
    /// rewritten when the transport reports a different message id.
    async fn ensure_menu(&self, chat_id: i64, view: MenuView) -> Result<(), EngineError> {
        let current = menu::get_chat_menu(self.db.pool(), chat_id).await?;
        match self
            .transport
            .send_or_edit_menu(chat_id, current, &view.text, &view.keyboard)
            .await
        {
            Ok(message_id) => {
                if current != Some(message_id) {
                    menu::set_chat_menu(self.db.pool(), chat_id, message_id).await?;
                }
            }
            Err(e) => warn!("Failed to refresh menu for chat {}: {}", chat_id, e),
        }
        Ok(())
    }

    async fn notify(&self, user_id: i64, text: &str) {
        if let Err(e) = self.transport.show_notice(user_id, text).await {
            warn!("Failed to show notice to user {}: {}", user_id, e);
        }
    }

    async fn delete_best_effort(&self, chat_id: i64, message_id: Option<i64>) {
        if let Some(message_id) = message_id {
            if let Err(e) = self.transport.delete_message(chat_id, message_id).await {
                warn!("Failed to delete message {} in chat {}: {}", message_id, chat_id, e);
            }
        }
    }

    async fn log(
        &self,
        chat_id: i64,
        user_id: i64,
        action: &str,
        detail: &str,
    ) -> Result<(), EngineError> {
        activity::log_activity(
            self.db.pool(),
            chat_id,
            user_id,
            action,
            detail,
            &self.clock.now().to_rfc3339(),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::stats::percent;
    use crate::transport::RecordingTransport;

    const CHAT: i64 = -1001;
    const ANNA: i64 = 1;
    const BOB: i64 = 2;

    /// Monday morning, fixed.
    const T0: &str = "2024-03-11T08:00:00Z";

    async fn harness() -> (ConversationEngine<RecordingTransport>, Arc<ManualClock>, Database) {
        let db = Database::connect_with_pool_size("sqlite::memory:", 1)
            .await
            .unwrap();
        db.migrate().await.unwrap();
        let clock = Arc::new(ManualClock::new(T0.parse().unwrap()));
        let engine = ConversationEngine::new(
            db.clone(),
            RecordingTransport::default(),
            clock.clone(),
            EngineConfig::default(),
        );
        (engine, clock, db)
    }

    async fn register(engine: &ConversationEngine<RecordingTransport>, user_id: i64, name: &str) {
        engine.handle_button(CHAT, user_id, "create_profile").await.unwrap();
        let outcome = engine.handle_text(CHAT, user_id, None, name).await.unwrap();
        assert_eq!(outcome, EventOutcome::Handled);
    }

    async fn create_goal(
        engine: &ConversationEngine<RecordingTransport>,
        user_id: i64,
        name: &str,
        target: &str,
    ) {
        engine.handle_button(CHAT, user_id, "add_goal").await.unwrap();
        engine.handle_text(CHAT, user_id, None, name).await.unwrap();
        engine.handle_text(CHAT, user_id, None, target).await.unwrap();
        engine.handle_button(CHAT, user_id, "goal_type_daily").await.unwrap();
    }

    #[tokio::test]
    async fn test_registration_flow() {
        let (engine, _clock, db) = harness().await;

        register(&engine, ANNA, "Anna").await;

        assert!(user::is_registered(db.pool(), ANNA).await.unwrap());
        assert_eq!(
            engine.transport().last_notice().unwrap(),
            "✅ Anna registered!"
        );
        // Dialog finished: further text is unsolicited.
        let outcome = engine.handle_text(CHAT, ANNA, None, "hello").await.unwrap();
        assert_eq!(outcome, EventOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_registration_rejects_long_name_and_keeps_session() {
        let (engine, _clock, db) = harness().await;

        engine.handle_button(CHAT, ANNA, "create_profile").await.unwrap();
        let long = "x".repeat(21);
        engine.handle_text(CHAT, ANNA, None, &long).await.unwrap();

        // Same prompt again, with the rejected input echoed.
        let menu = engine.transport().last_menu_text().unwrap();
        assert!(menu.contains("NEW MEMBER REGISTRATION"));
        assert!(menu.contains("(21 characters)"));
        assert!(!user::is_registered(db.pool(), ANNA).await.unwrap());

        // The session survived the failure, so a valid retry lands.
        engine.handle_text(CHAT, ANNA, None, "Anna").await.unwrap();
        assert!(user::is_registered(db.pool(), ANNA).await.unwrap());
    }

    #[tokio::test]
    async fn test_validation_failure_does_not_reset_ttl() {
        let (engine, clock, db) = harness().await;

        engine.handle_button(CHAT, ANNA, "create_profile").await.unwrap();

        // Fail validation at T+200; the 300 s clock keeps running from T0.
        clock.advance(chrono::Duration::seconds(200));
        engine.handle_text(CHAT, ANNA, None, &"x".repeat(30)).await.unwrap();

        clock.advance(chrono::Duration::seconds(101));
        let outcome = engine.handle_text(CHAT, ANNA, None, "Anna").await.unwrap();
        assert_eq!(outcome, EventOutcome::Ignored);
        assert!(!user::is_registered(db.pool(), ANNA).await.unwrap());
    }

    #[tokio::test]
    async fn test_already_registered_notice() {
        let (engine, _clock, _db) = harness().await;
        register(&engine, ANNA, "Anna").await;

        engine.handle_button(CHAT, ANNA, "create_profile").await.unwrap();
        assert_eq!(
            engine.transport().last_notice().unwrap(),
            NOTICE_ALREADY_REGISTERED
        );
        // No new dialog was opened.
        let outcome = engine.handle_text(CHAT, ANNA, None, "Anna again").await.unwrap();
        assert_eq!(outcome, EventOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_goal_creation_flow() {
        let (engine, _clock, db) = harness().await;
        register(&engine, ANNA, "Anna").await;

        create_goal(&engine, ANNA, "Pushups", "50").await;

        let goals = goal::list_active_goals(db.pool(), CHAT).await.unwrap();
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].name, "Pushups");
        assert_eq!(goals[0].target, 50);
        assert_eq!(goals[0].kind, GoalKind::Daily);
        assert_eq!(goals[0].created_by, ANNA);
        assert_eq!(
            engine.transport().last_notice().unwrap(),
            "✅ Goal 'Pushups' added"
        );
    }

    #[tokio::test]
    async fn test_goal_target_reprompts_on_bad_input() {
        let (engine, _clock, db) = harness().await;
        register(&engine, ANNA, "Anna").await;

        engine.handle_button(CHAT, ANNA, "add_goal").await.unwrap();
        engine.handle_text(CHAT, ANNA, None, "Pushups").await.unwrap();

        engine.handle_text(CHAT, ANNA, None, "lots").await.unwrap();
        let menu = engine.transport().last_menu_text().unwrap();
        assert!(menu.contains("whole number"));
        assert!(menu.contains("'lots'"));

        engine.handle_text(CHAT, ANNA, None, "10001").await.unwrap();
        let menu = engine.transport().last_menu_text().unwrap();
        assert!(menu.contains("between 1 and 10000"));

        // Still in the dialog; a valid target advances.
        engine.handle_text(CHAT, ANNA, None, "50").await.unwrap();
        engine.handle_button(CHAT, ANNA, "goal_type_monthly").await.unwrap();
        let goals = goal::list_active_goals(db.pool(), CHAT).await.unwrap();
        assert_eq!(goals[0].kind, GoalKind::Monthly);
    }

    #[tokio::test]
    async fn test_progress_end_to_end() {
        let (engine, _clock, db) = harness().await;
        register(&engine, ANNA, "Anna").await;
        create_goal(&engine, ANNA, "Pushups", "50").await;
        let goal_id = goal::list_active_goals(db.pool(), CHAT).await.unwrap()[0].goal_id;

        engine.handle_button(CHAT, ANNA, "mark_progress").await.unwrap();
        engine
            .handle_button(CHAT, ANNA, &format!("select_goal_{}", goal_id))
            .await
            .unwrap();
        engine.handle_text(CHAT, ANNA, None, "20").await.unwrap();

        let aggregator = ProgressAggregator::new(db.clone());
        let today = "2024-03-11".parse().unwrap();
        let total = aggregator.day_progress(ANNA, goal_id, today).await.unwrap();
        assert_eq!(total, 20);
        assert_eq!(percent(total, 50), 40);

        // A second submission accumulates and the percent clamps at 100.
        engine.handle_button(CHAT, ANNA, "mark_progress").await.unwrap();
        engine
            .handle_button(CHAT, ANNA, &format!("select_goal_{}", goal_id))
            .await
            .unwrap();
        engine.handle_text(CHAT, ANNA, None, "40").await.unwrap();

        let total = aggregator.day_progress(ANNA, goal_id, today).await.unwrap();
        assert_eq!(total, 60);
        assert_eq!(percent(total, 50), 100);

        assert_eq!(
            engine.transport().last_notice().unwrap(),
            "✅ +40 Pushups logged!"
        );
    }

    #[tokio::test]
    async fn test_progress_amount_rejected() {
        let (engine, _clock, db) = harness().await;
        register(&engine, ANNA, "Anna").await;
        create_goal(&engine, ANNA, "Pushups", "50").await;
        let goal_id = goal::list_active_goals(db.pool(), CHAT).await.unwrap()[0].goal_id;

        engine
            .handle_button(CHAT, ANNA, &format!("select_goal_{}", goal_id))
            .await
            .unwrap();
        engine.handle_text(CHAT, ANNA, None, "-5").await.unwrap();
        let menu = engine.transport().last_menu_text().unwrap();
        assert!(menu.contains("positive number"));

        // Retry works without reopening the dialog.
        engine.handle_text(CHAT, ANNA, None, "5").await.unwrap();
        let aggregator = ProgressAggregator::new(db.clone());
        let total = aggregator
            .day_progress(ANNA, goal_id, "2024-03-11".parse().unwrap())
            .await
            .unwrap();
        assert_eq!(total, 5);
    }

    #[tokio::test]
    async fn test_second_user_gets_conflict() {
        let (engine, _clock, db) = harness().await;
        register(&engine, ANNA, "Anna").await;

        // Anna opens a dialog; Bob tries to open his own and to type.
        engine.handle_button(CHAT, ANNA, "add_goal").await.unwrap();
        let outcome = engine.handle_button(CHAT, BOB, "create_profile").await.unwrap();
        assert_eq!(outcome, EventOutcome::Conflict);
        assert_eq!(engine.transport().last_notice().unwrap(), NOTICE_WAIT);

        let outcome = engine.handle_text(CHAT, BOB, None, "Bob").await.unwrap();
        assert_eq!(outcome, EventOutcome::Conflict);

        // Anna's dialog survived both rejections.
        engine.handle_text(CHAT, ANNA, None, "Pushups").await.unwrap();
        engine.handle_text(CHAT, ANNA, None, "50").await.unwrap();
        engine.handle_button(CHAT, ANNA, "goal_type_daily").await.unwrap();
        assert_eq!(goal::list_active_goals(db.pool(), CHAT).await.unwrap().len(), 1);
        assert!(!user::is_registered(db.pool(), BOB).await.unwrap());
    }

    #[tokio::test]
    async fn test_dialogs_in_different_chats_are_independent() {
        let (engine, _clock, db) = harness().await;
        register(&engine, ANNA, "Anna").await;

        engine.handle_button(CHAT, ANNA, "add_goal").await.unwrap();
        // Bob's registration in another chat is not a conflict.
        let outcome = engine.handle_button(-2002, BOB, "create_profile").await.unwrap();
        assert_eq!(outcome, EventOutcome::Handled);
        engine.handle_text(-2002, BOB, None, "Bob").await.unwrap();
        assert!(user::is_registered(db.pool(), BOB).await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_terminal_step_creates_nothing() {
        let (engine, clock, db) = harness().await;
        register(&engine, ANNA, "Anna").await;

        engine.handle_button(CHAT, ANNA, "add_goal").await.unwrap();
        engine.handle_text(CHAT, ANNA, None, "Pushups").await.unwrap();
        engine.handle_text(CHAT, ANNA, None, "50").await.unwrap();

        clock.advance(chrono::Duration::seconds(301));
        let outcome = engine.handle_button(CHAT, ANNA, "goal_type_daily").await.unwrap();
        assert_eq!(outcome, EventOutcome::Handled);
        assert_eq!(
            engine.transport().last_notice().unwrap(),
            NOTICE_SESSION_EXPIRED
        );
        assert!(goal::list_active_goals(db.pool(), CHAT).await.unwrap().is_empty());

        // Back at the idle menu.
        let menu = engine.transport().last_menu_text().unwrap();
        assert!(menu.contains("FITNESS GROUP"));
    }

    #[tokio::test]
    async fn test_cancel_clears_session_and_scratch() {
        let (engine, _clock, db) = harness().await;
        register(&engine, ANNA, "Anna").await;

        engine.handle_button(CHAT, ANNA, "statistics").await.unwrap();
        engine.handle_button(CHAT, ANNA, "statistics_next").await.unwrap();
        engine.handle_button(CHAT, ANNA, "add_goal").await.unwrap();

        engine.handle_button(CHAT, ANNA, "cancel").await.unwrap();

        assert!(scratch::get_value(db.pool(), ANNA, "stats_page").await.unwrap().is_none());
        let outcome = engine.handle_text(CHAT, ANNA, None, "Pushups").await.unwrap();
        assert_eq!(outcome, EventOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_commands_are_ignored_by_the_fsm() {
        let (engine, _clock, db) = harness().await;

        engine.handle_button(CHAT, ANNA, "create_profile").await.unwrap();
        let outcome = engine.handle_text(CHAT, ANNA, None, "/start").await.unwrap();
        assert_eq!(outcome, EventOutcome::Ignored);

        // The dialog is still waiting for a name.
        engine.handle_text(CHAT, ANNA, None, "Anna").await.unwrap();
        assert!(user::is_registered(db.pool(), ANNA).await.unwrap());
    }

    #[tokio::test]
    async fn test_unregistered_users_are_guarded() {
        let (engine, _clock, _db) = harness().await;

        for action in ["add_goal", "mark_progress", "statistics", "settings", "change_name"] {
            engine.handle_button(CHAT, ANNA, action).await.unwrap();
            assert_eq!(
                engine.transport().last_notice().unwrap(),
                NOTICE_PROFILE_REQUIRED,
                "action {} must require a profile",
                action
            );
        }
    }

    #[tokio::test]
    async fn test_delete_goal_flow() {
        let (engine, _clock, db) = harness().await;
        register(&engine, ANNA, "Anna").await;
        create_goal(&engine, ANNA, "Pushups", "50").await;
        let goal_id = goal::list_active_goals(db.pool(), CHAT).await.unwrap()[0].goal_id;

        engine.handle_button(CHAT, ANNA, "delete_goal").await.unwrap();
        engine
            .handle_button(CHAT, ANNA, &format!("confirm_delete_{}", goal_id))
            .await
            .unwrap();
        let menu = engine.transport().last_menu_text().unwrap();
        assert!(menu.contains("Are you sure"));

        engine
            .handle_button(CHAT, ANNA, &format!("execute_delete_{}", goal_id))
            .await
            .unwrap();
        assert!(goal::list_active_goals(db.pool(), CHAT).await.unwrap().is_empty());
        // Soft delete only: the row is still there.
        assert!(!goal::get_goal(db.pool(), goal_id).await.unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn test_vanished_goal_on_submission() {
        let (engine, _clock, db) = harness().await;
        register(&engine, ANNA, "Anna").await;
        create_goal(&engine, ANNA, "Pushups", "50").await;
        let goal_id = goal::list_active_goals(db.pool(), CHAT).await.unwrap()[0].goal_id;

        engine
            .handle_button(CHAT, ANNA, &format!("select_goal_{}", goal_id))
            .await
            .unwrap();
        // Deleted out from under the dialog.
        goal::deactivate_goal(db.pool(), goal_id).await.unwrap();

        engine.handle_text(CHAT, ANNA, None, "20").await.unwrap();
        assert_eq!(
            engine.transport().last_notice().unwrap(),
            NOTICE_GOAL_NOT_FOUND
        );
        let aggregator = ProgressAggregator::new(db.clone());
        let total = aggregator
            .day_progress(ANNA, goal_id, "2024-03-11".parse().unwrap())
            .await
            .unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_settings_and_notification_toggle() {
        let (engine, _clock, _db) = harness().await;
        register(&engine, ANNA, "Anna").await;

        engine.handle_button(CHAT, ANNA, "settings").await.unwrap();
        let menu = engine.transport().last_menu_text().unwrap();
        assert!(menu.contains("Name: Anna"));
        assert!(menu.contains("✅ ON"));

        engine.handle_button(CHAT, ANNA, "toggle_notifications").await.unwrap();
        // Settings re-rendered in place with the new status.
        let menu = engine.transport().last_menu_text().unwrap();
        assert!(menu.contains("❌ OFF"));
        assert_eq!(
            engine.transport().last_notice().unwrap(),
            "✅ Notifications disabled"
        );
    }

    #[tokio::test]
    async fn test_rename_flow() {
        let (engine, _clock, db) = harness().await;
        register(&engine, ANNA, "Anna").await;

        engine.handle_button(CHAT, ANNA, "change_name").await.unwrap();
        engine.handle_text(CHAT, ANNA, None, "Anya").await.unwrap();

        assert_eq!(user::get_user(db.pool(), ANNA).await.unwrap().name, "Anya");
        assert_eq!(
            engine.transport().last_notice().unwrap(),
            "✅ Name changed to 'Anya'"
        );
    }

    #[tokio::test]
    async fn test_reset_today_and_profile_deletion() {
        let (engine, _clock, db) = harness().await;
        register(&engine, ANNA, "Anna").await;
        create_goal(&engine, ANNA, "Pushups", "50").await;
        let goal_id = goal::list_active_goals(db.pool(), CHAT).await.unwrap()[0].goal_id;

        engine
            .handle_button(CHAT, ANNA, &format!("select_goal_{}", goal_id))
            .await
            .unwrap();
        engine.handle_text(CHAT, ANNA, None, "20").await.unwrap();

        engine.handle_button(CHAT, ANNA, "reset_today").await.unwrap();
        let aggregator = ProgressAggregator::new(db.clone());
        let today = "2024-03-11".parse().unwrap();
        assert_eq!(aggregator.day_progress(ANNA, goal_id, today).await.unwrap(), 0);

        engine.handle_button(CHAT, ANNA, "delete_profile").await.unwrap();
        assert!(!user::is_registered(db.pool(), ANNA).await.unwrap());
        // The refreshed menu shows the unregistered keyboard again.
        let recorded = engine.transport().recorded();
        let (_, _, _, keyboard) = recorded.menus.last().unwrap();
        let actions: Vec<_> = keyboard.rows.iter().flatten().map(|b| b.action.as_str()).collect();
        assert!(actions.contains(&"create_profile"));
        assert!(!actions.contains(&"add_goal"));
    }

    #[tokio::test]
    async fn test_statistics_views() {
        let (engine, _clock, db) = harness().await;
        register(&engine, ANNA, "Anna").await;
        create_goal(&engine, ANNA, "Pushups", "50").await;
        let goal_id = goal::list_active_goals(db.pool(), CHAT).await.unwrap()[0].goal_id;
        engine
            .handle_button(CHAT, ANNA, &format!("select_goal_{}", goal_id))
            .await
            .unwrap();
        engine.handle_text(CHAT, ANNA, None, "25").await.unwrap();

        engine.handle_button(CHAT, ANNA, "statistics").await.unwrap();
        let menu = engine.transport().last_menu_text().unwrap();
        assert!(menu.contains("HISTORY"));
        assert!(menu.contains("MON 11"));
        // 25 of 50 possible: the Monday bar shows 50%.
        assert!(menu.contains("50% (25)"));

        engine.handle_button(CHAT, ANNA, "stats_day_2024-03-11").await.unwrap();
        let menu = engine.transport().last_menu_text().unwrap();
        assert!(menu.contains("DAY DETAIL"));
        assert!(menu.contains("Anna: 25/50 (50%)"));

        // Back restores the week page from scratch state.
        engine.handle_button(CHAT, ANNA, "statistics_back").await.unwrap();
        assert!(engine.transport().last_menu_text().unwrap().contains("HISTORY"));

        // Paging clamps at the oldest page.
        for _ in 0..6 {
            engine.handle_button(CHAT, ANNA, "statistics_next").await.unwrap();
        }
        let menu = engine.transport().last_menu_text().unwrap();
        assert!(menu.contains("WEEK 19-25 FEBRUARY"));
    }

    #[tokio::test]
    async fn test_menu_message_edited_in_place() {
        let (engine, _clock, db) = harness().await;

        engine.open_menu(CHAT, ANNA, Some(555)).await.unwrap();
        engine.open_menu(CHAT, ANNA, None).await.unwrap();

        let recorded = engine.transport().recorded();
        assert_eq!(recorded.menus.len(), 2);
        // First refresh sends a new message, second edits it.
        assert_eq!(recorded.menus[0].1, None);
        let id = menu::get_chat_menu(db.pool(), CHAT).await.unwrap().unwrap();
        assert_eq!(recorded.menus[1].1, Some(id));
    }

    #[tokio::test]
    async fn test_transport_failure_does_not_abort_the_step() {
        let (engine, _clock, db) = harness().await;

        engine.handle_button(CHAT, ANNA, "create_profile").await.unwrap();
        engine
            .transport()
            .fail
            .store(true, std::sync::atomic::Ordering::SeqCst);

        // The commit still lands even though every transport call fails.
        let outcome = engine.handle_text(CHAT, ANNA, None, "Anna").await.unwrap();
        assert_eq!(outcome, EventOutcome::Handled);
        assert!(user::is_registered(db.pool(), ANNA).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_callback_is_ignored() {
        let (engine, _clock, _db) = harness().await;
        let outcome = engine.handle_button(CHAT, ANNA, "frobnicate").await.unwrap();
        assert_eq!(outcome, EventOutcome::Ignored);
        let outcome = engine.handle_button(CHAT, ANNA, "noop").await.unwrap();
        assert_eq!(outcome, EventOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_activity_feed_on_menu() {
        let (engine, _clock, _db) = harness().await;
        register(&engine, ANNA, "Anna").await;
        create_goal(&engine, ANNA, "Pushups", "50").await;

        engine.open_menu(CHAT, ANNA, None).await.unwrap();
        let menu = engine.transport().last_menu_text().unwrap();
        assert!(menu.contains("RECENT ACTIVITY"));
        assert!(menu.contains("Anna: created goal Pushups"));
        assert!(menu.contains("Anna: joined the group"));
    }
}
