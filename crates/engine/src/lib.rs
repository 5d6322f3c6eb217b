//! Conversation engine for the Strive group fitness bot.
//!
//! This crate provides the [`ConversationEngine`] type which drives the
//! multi-step dialog state machine, the [`SessionManager`] owning the
//! one-dialog-per-chat invariant, and the [`ProgressAggregator`] computing
//! daily/weekly statistics over the store.
//!
//! # Architecture
//!
//! ```text
//! Inbound text / button press (from the transport binding)
//!          ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    CONVERSATION ENGINE                      │
//! │                                                             │
//! │  1. Acquire the chat's serialization guard                  │
//! │         ↓                                                   │
//! │  2. Resolve the live session (lazy 300 s expiry)            │
//! │     • other member's dialog in flight → "please wait"       │
//! │         ↓                                                   │
//! │  3. Validate input, or dispatch the button action           │
//! │     • validation failure → re-prompt, session untouched     │
//! │         ↓                                                   │
//! │  4. Commit → clear/advance session → log activity           │
//! │         ↓                                                   │
//! │  5. Refresh the chat's single pinned menu message           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use database::Database;
//! use engine::{ConversationEngine, EngineConfig, SystemClock, Transport};
//!
//! // Implement Transport for your chat platform
//! struct TelegramTransport { /* ... */ }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("sqlite:strive.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let transport = TelegramTransport { /* ... */ };
//!     let engine = ConversationEngine::new(
//!         db,
//!         transport,
//!         Arc::new(SystemClock),
//!         EngineConfig::from_env(),
//!     );
//!
//!     // Wire platform updates into the engine:
//!     engine.handle_text(chat_id, user_id, Some(message_id), "20").await?;
//!     engine.handle_button(chat_id, user_id, "mark_progress").await?;
//!     Ok(())
//! }
//! ```

mod actions;
mod clock;
mod config;
mod engine;
mod error;
mod render;
mod session;
mod state;
mod stats;
mod transport;

// Public exports
pub use actions::ButtonAction;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use engine::{ConversationEngine, EventOutcome, HELP_TEXT, STATS_PAGE_COUNT};
pub use error::EngineError;
pub use render::{GoalPickerRow, InputError, MenuRenderer, MenuView, TextMenuRenderer};
pub use session::{Session, SessionManager, SESSION_TTL_SECS};
pub use state::DialogState;
pub use stats::{
    percent, DayDetail, DayEntry, DayGoal, DayTotal, GoalBoard, MenuSnapshot, ProgressAggregator,
    UserProgressLine, UserStats, WeekPage,
};
pub use transport::{
    Button, Keyboard, LoggingTransport, NoOpTransport, RecordingTransport, Transport,
    TransportError,
};

// Re-export commonly used types from the persistence layer
pub use database::{Database, DatabaseError, Goal, GoalKind, User, ValidationError};
