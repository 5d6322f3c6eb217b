//! Chat transport trait and implementations.

use async_trait::async_trait;
use thiserror::Error;

/// One inline keyboard button: a label plus an opaque callback tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: String,
}

impl Button {
    pub fn new(label: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: action.into(),
        }
    }
}

/// An inline keyboard: rows of buttons attached to the menu message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row of buttons.
    pub fn row(&mut self, buttons: Vec<Button>) -> &mut Self {
        self.rows.push(buttons);
        self
    }
}

/// Errors that can occur while talking to the chat platform.
///
/// The engine treats every transport failure as best-effort: it is logged
/// and swallowed, never aborting the business step that triggered it.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("send failed: {0}")]
    Send(String),

    #[error("delete failed: {0}")]
    Delete(String),

    #[error("notice failed: {0}")]
    Notice(String),
}

/// Trait for the chat platform the bot runs on.
///
/// Abstracted to support different transports (Telegram-style bots, tests,
/// etc.)
#[async_trait]
pub trait Transport: Send + Sync {
    /// Show `text` + `keyboard` as the chat's pinned menu.
    ///
    /// When `message_id` is given the transport should edit that message in
    /// place, falling back to sending a fresh message if the edit fails.
    /// Returns the id of the message now displaying the menu.
    async fn send_or_edit_menu(
        &self,
        chat_id: i64,
        message_id: Option<i64>,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<i64, TransportError>;

    /// Delete a message. Best-effort.
    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), TransportError>;

    /// Show a short ephemeral popup to one user. Best-effort, not persisted.
    async fn show_notice(&self, user_id: i64, text: &str) -> Result<(), TransportError>;
}

/// A no-op transport for tests that discards everything.
#[derive(Debug, Clone, Default)]
pub struct NoOpTransport;

#[async_trait]
impl Transport for NoOpTransport {
    async fn send_or_edit_menu(
        &self,
        _chat_id: i64,
        message_id: Option<i64>,
        _text: &str,
        _keyboard: &Keyboard,
    ) -> Result<i64, TransportError> {
        Ok(message_id.unwrap_or(1))
    }

    async fn delete_message(&self, _chat_id: i64, _message_id: i64) -> Result<(), TransportError> {
        Ok(())
    }

    async fn show_notice(&self, _user_id: i64, _text: &str) -> Result<(), TransportError> {
        Ok(())
    }
}

/// A logging transport for debugging that logs all operations.
#[derive(Debug, Clone, Default)]
pub struct LoggingTransport;

#[async_trait]
impl Transport for LoggingTransport {
    async fn send_or_edit_menu(
        &self,
        chat_id: i64,
        message_id: Option<i64>,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<i64, TransportError> {
        tracing::info!(
            "[menu] chat {} (message {:?}, {} button rows): {}",
            chat_id,
            message_id,
            keyboard.rows.len(),
            text
        );
        Ok(message_id.unwrap_or(1))
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), TransportError> {
        tracing::info!("[delete] chat {} message {}", chat_id, message_id);
        Ok(())
    }

    async fn show_notice(&self, user_id: i64, text: &str) -> Result<(), TransportError> {
        tracing::info!("[notice] user {}: {}", user_id, text);
        Ok(())
    }
}

/// A transport that records every call, for tests.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    inner: std::sync::Mutex<Recorded>,
    /// When set, every call fails (for best-effort behavior tests).
    pub fail: std::sync::atomic::AtomicBool,
}

#[derive(Debug, Default, Clone)]
pub struct Recorded {
    /// (chat_id, edited message id, text, keyboard) per menu refresh.
    pub menus: Vec<(i64, Option<i64>, String, Keyboard)>,
    /// (user_id, text) per ephemeral notice.
    pub notices: Vec<(i64, String)>,
    next_message_id: i64,
}

impl RecordingTransport {
    /// Snapshot of everything recorded so far.
    pub fn recorded(&self) -> Recorded {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Text of the most recent menu refresh, if any.
    pub fn last_menu_text(&self) -> Option<String> {
        self.recorded().menus.last().map(|(_, _, text, _)| text.clone())
    }

    /// Text of the most recent notice, if any.
    pub fn last_notice(&self) -> Option<String> {
        self.recorded().notices.last().map(|(_, text)| text.clone())
    }

    fn failing(&self) -> bool {
        self.fail.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_or_edit_menu(
        &self,
        chat_id: i64,
        message_id: Option<i64>,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<i64, TransportError> {
        if self.failing() {
            return Err(TransportError::Send("transport down".to_string()));
        }
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner
            .menus
            .push((chat_id, message_id, text.to_string(), keyboard.clone()));
        match message_id {
            Some(id) => Ok(id),
            None => {
                inner.next_message_id += 1;
                Ok(inner.next_message_id)
            }
        }
    }

    async fn delete_message(&self, _chat_id: i64, _message_id: i64) -> Result<(), TransportError> {
        if self.failing() {
            return Err(TransportError::Delete("transport down".to_string()));
        }
        Ok(())
    }

    async fn show_notice(&self, user_id: i64, text: &str) -> Result<(), TransportError> {
        if self.failing() {
            return Err(TransportError::Notice("transport down".to_string()));
        }
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .notices
            .push((user_id, text.to_string()));
        Ok(())
    }
}
