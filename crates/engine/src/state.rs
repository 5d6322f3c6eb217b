//! Dialog states and their typed payloads.
//!
//! Each payload-carrying state has its own record shape; a step that finds
//! the wrong shape (or none) in the stored row treats the session as stale.
//! Tags and JSON keys are stable so stored rows keep decoding across
//! releases.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// The closed set of multi-step dialog states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogState {
    /// Registration: waiting for a display name.
    WaitingForName,
    /// Rename: waiting for the new display name.
    WaitingForNewName,
    /// Goal creation, step 1: waiting for the goal name.
    WaitingForGoalName,
    /// Goal creation, step 2: waiting for the numeric target.
    WaitingForGoalTarget { goal_name: String },
    /// Goal creation, step 3: waiting for the daily/monthly button.
    WaitingForGoalType { goal_name: String, goal_target: i64 },
    /// Progress logging: waiting for the amount.
    WaitingForCompleteNumber { goal_id: i64, goal_name: String },
}

#[derive(Debug, Serialize, Deserialize)]
struct GoalNamePayload {
    goal_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct GoalTargetPayload {
    goal_name: String,
    goal_target: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct CompleteNumberPayload {
    goal_id: i64,
    goal_name: String,
}

impl DialogState {
    /// Stable tag stored in the session row's `state` column.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::WaitingForName => "waiting_for_name",
            Self::WaitingForNewName => "waiting_for_new_name",
            Self::WaitingForGoalName => "waiting_for_goal_name",
            Self::WaitingForGoalTarget { .. } => "waiting_for_goal_target",
            Self::WaitingForGoalType { .. } => "waiting_for_goal_type",
            Self::WaitingForCompleteNumber { .. } => "waiting_for_complete_number",
        }
    }

    /// JSON payload for the session row's `data` column, if the state
    /// carries one.
    pub fn payload_json(&self) -> Result<Option<String>, EngineError> {
        let json = match self {
            Self::WaitingForName | Self::WaitingForNewName | Self::WaitingForGoalName => None,
            Self::WaitingForGoalTarget { goal_name } => Some(serde_json::to_string(&GoalNamePayload {
                goal_name: goal_name.clone(),
            })?),
            Self::WaitingForGoalType {
                goal_name,
                goal_target,
            } => Some(serde_json::to_string(&GoalTargetPayload {
                goal_name: goal_name.clone(),
                goal_target: *goal_target,
            })?),
            Self::WaitingForCompleteNumber { goal_id, goal_name } => {
                Some(serde_json::to_string(&CompleteNumberPayload {
                    goal_id: *goal_id,
                    goal_name: goal_name.clone(),
                })?)
            }
        };
        Ok(json)
    }

    /// Rebuild a state from its stored (tag, payload) parts.
    ///
    /// Returns `None` when the tag is unknown or the payload is missing or
    /// of the wrong shape — the caller treats that row as stale.
    pub fn from_parts(tag: &str, data: Option<&str>) -> Option<Self> {
        match tag {
            "waiting_for_name" => Some(Self::WaitingForName),
            "waiting_for_new_name" => Some(Self::WaitingForNewName),
            "waiting_for_goal_name" => Some(Self::WaitingForGoalName),
            "waiting_for_goal_target" => {
                let payload: GoalNamePayload = serde_json::from_str(data?).ok()?;
                Some(Self::WaitingForGoalTarget {
                    goal_name: payload.goal_name,
                })
            }
            "waiting_for_goal_type" => {
                let payload: GoalTargetPayload = serde_json::from_str(data?).ok()?;
                Some(Self::WaitingForGoalType {
                    goal_name: payload.goal_name,
                    goal_target: payload.goal_target,
                })
            }
            "waiting_for_complete_number" => {
                let payload: CompleteNumberPayload = serde_json::from_str(data?).ok()?;
                Some(Self::WaitingForCompleteNumber {
                    goal_id: payload.goal_id,
                    goal_name: payload.goal_name,
                })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_all_states() {
        let states = [
            DialogState::WaitingForName,
            DialogState::WaitingForNewName,
            DialogState::WaitingForGoalName,
            DialogState::WaitingForGoalTarget {
                goal_name: "Pushups".to_string(),
            },
            DialogState::WaitingForGoalType {
                goal_name: "Pushups".to_string(),
                goal_target: 50,
            },
            DialogState::WaitingForCompleteNumber {
                goal_id: 3,
                goal_name: "Pushups".to_string(),
            },
        ];

        for state in states {
            let json = state.payload_json().unwrap();
            let rebuilt = DialogState::from_parts(state.tag(), json.as_deref());
            assert_eq!(rebuilt, Some(state));
        }
    }

    #[test]
    fn test_payload_keys_are_wire_compatible() {
        let state = DialogState::WaitingForGoalType {
            goal_name: "Pushups".to_string(),
            goal_target: 50,
        };
        let json = state.payload_json().unwrap().unwrap();
        assert_eq!(json, r#"{"goal_name":"Pushups","goal_target":50}"#);
    }

    #[test]
    fn test_missing_or_mismatched_payload_is_stale() {
        // Payload-carrying state without a payload.
        assert_eq!(DialogState::from_parts("waiting_for_goal_target", None), None);
        // Payload of the wrong shape.
        assert_eq!(
            DialogState::from_parts("waiting_for_goal_type", Some(r#"{"goal_name":"Pushups"}"#)),
            None
        );
        // Unknown tag.
        assert_eq!(DialogState::from_parts("waiting_for_magic", None), None);
        // Corrupt JSON.
        assert_eq!(DialogState::from_parts("waiting_for_goal_target", Some("{")), None);
    }
}
