//! Error types for engine operations.

use database::DatabaseError;
use thiserror::Error;

/// Errors that abort an engine step.
///
/// Validation failures, session conflicts, stale sessions, and vanished
/// goals are all recovered in place (re-prompt, notice, or menu refresh),
/// so they never surface here. Only failures of the store itself — which
/// must abort the step before the session advances past an uncommitted
/// change — propagate to the caller.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Underlying persistence failed.
    #[error("store error: {0}")]
    Store(#[from] DatabaseError),

    /// A session payload could not be encoded.
    #[error("session payload error: {0}")]
    Payload(#[from] serde_json::Error),
}
