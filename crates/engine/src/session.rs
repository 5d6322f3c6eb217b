//! The one-active-dialog-per-chat invariant.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use database::{session as session_store, Database};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::warn;

use crate::clock::Clock;
use crate::error::EngineError;
use crate::state::DialogState;

/// How long a dialog stays actionable after it starts, in seconds.
pub const SESSION_TTL_SECS: i64 = 300;

/// A live dialog session for one chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// The user driving the dialog; only they may advance it.
    pub user_id: i64,
    pub state: DialogState,
    pub started_at: DateTime<Utc>,
}

/// Owns session storage, expiry, and per-chat serialization.
///
/// A session older than [`SESSION_TTL_SECS`] is expired: `get` deletes it as a
/// side effect of the read and reports it absent, so no background sweep is
/// required. `start` unconditionally replaces whatever session the chat had.
pub struct SessionManager {
    db: Database,
    clock: Arc<dyn Clock>,
    locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl SessionManager {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self {
            db,
            clock,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire the chat's serialization lock.
    ///
    /// All event handling for one chat runs under this guard; different
    /// chats proceed in parallel.
    pub async fn guard(&self, chat_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(chat_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// The chat's live session, or `None` if absent or expired.
    pub async fn get(&self, chat_id: i64) -> Result<Option<Session>, EngineError> {
        let Some(row) = session_store::get_session(self.db.pool(), chat_id).await? else {
            return Ok(None);
        };

        let started_at = match DateTime::parse_from_rfc3339(&row.started_at) {
            Ok(dt) => dt.with_timezone(&Utc),
            Err(e) => {
                warn!("Discarding session with bad timestamp for chat {}: {}", chat_id, e);
                session_store::clear_session(self.db.pool(), chat_id).await?;
                return Ok(None);
            }
        };

        if (self.clock.now() - started_at).num_seconds() > SESSION_TTL_SECS {
            session_store::clear_session(self.db.pool(), chat_id).await?;
            return Ok(None);
        }

        let Some(state) = DialogState::from_parts(&row.state, row.data.as_deref()) else {
            // Unknown tag or payload of the wrong shape: stale.
            warn!("Discarding stale session row for chat {} (state {})", chat_id, row.state);
            session_store::clear_session(self.db.pool(), chat_id).await?;
            return Ok(None);
        };

        Ok(Some(Session {
            user_id: row.user_id,
            state,
            started_at,
        }))
    }

    /// Start a dialog, replacing any existing session for the chat.
    pub async fn start(
        &self,
        chat_id: i64,
        user_id: i64,
        state: DialogState,
    ) -> Result<(), EngineError> {
        let payload = state.payload_json()?;
        session_store::set_session(
            self.db.pool(),
            chat_id,
            user_id,
            state.tag(),
            payload.as_deref(),
            &self.clock.now().to_rfc3339(),
        )
        .await?;
        Ok(())
    }

    /// Remove the chat's session, if any. Idempotent.
    pub async fn clear(&self, chat_id: i64) -> Result<(), EngineError> {
        session_store::clear_session(self.db.pool(), chat_id).await?;
        Ok(())
    }
}
