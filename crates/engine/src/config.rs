//! Engine configuration.

use std::env;

use chrono::FixedOffset;

/// Configuration for the conversation engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Fixed offset from UTC used for calendar-day boundaries.
    ///
    /// Day and week rollups follow this configured timezone, never the
    /// execution host's local time.
    pub utc_offset: FixedOffset,
    /// How many activity records the main menu shows.
    pub recent_activities: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            utc_offset: FixedOffset::east_opt(0).expect("zero offset is valid"),
            recent_activities: 5,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional env vars:
    /// - `STRIVE_UTC_OFFSET_MINUTES` (default: 0)
    /// - `STRIVE_RECENT_ACTIVITIES` (default: 5)
    pub fn from_env() -> Self {
        let offset_minutes: i32 = env::var("STRIVE_UTC_OFFSET_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let utc_offset = FixedOffset::east_opt(offset_minutes * 60)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"));

        let recent_activities = env::var("STRIVE_RECENT_ACTIVITIES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);

        Self {
            utc_offset,
            recent_activities,
        }
    }

    /// Set the UTC offset in whole minutes.
    pub fn with_utc_offset_minutes(mut self, minutes: i32) -> Self {
        if let Some(offset) = FixedOffset::east_opt(minutes * 60) {
            self.utc_offset = offset;
        }
        self
    }
}
