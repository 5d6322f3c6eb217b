//! Input validation for dialog text input.

use std::fmt;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Display name outside 1-20 characters.
    NameLength { actual: usize },
    /// Goal name outside 1-30 characters.
    GoalNameLength { actual: usize },
    /// Input that should be an integer is not one.
    NotANumber,
    /// Goal target outside 1-10000.
    TargetOutOfRange { value: i64 },
    /// Progress amount that is zero or negative.
    AmountNotPositive { value: i64 },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::NameLength { actual } => {
                write!(f, "name must be 1-{} characters (got {})", MAX_NAME_LENGTH, actual)
            }
            ValidationError::GoalNameLength { actual } => {
                write!(
                    f,
                    "goal name must be 1-{} characters (got {})",
                    MAX_GOAL_NAME_LENGTH, actual
                )
            }
            ValidationError::NotANumber => write!(f, "expected a whole number"),
            ValidationError::TargetOutOfRange { value } => {
                write!(f, "target must be between 1 and {} (got {})", MAX_GOAL_TARGET, value)
            }
            ValidationError::AmountNotPositive { value } => {
                write!(f, "amount must be positive (got {})", value)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Maximum allowed length for member display names.
pub const MAX_NAME_LENGTH: usize = 20;

/// Maximum allowed length for goal names.
pub const MAX_GOAL_NAME_LENGTH: usize = 30;

/// Maximum allowed goal target value.
pub const MAX_GOAL_TARGET: i64 = 10_000;

/// Validate a member display name (1-20 characters).
pub fn validate_user_name(name: &str) -> Result<(), ValidationError> {
    let len = name.chars().count();
    if len == 0 || len > MAX_NAME_LENGTH {
        return Err(ValidationError::NameLength { actual: len });
    }
    Ok(())
}

/// Validate a goal name (1-30 characters).
pub fn validate_goal_name(name: &str) -> Result<(), ValidationError> {
    let len = name.chars().count();
    if len == 0 || len > MAX_GOAL_NAME_LENGTH {
        return Err(ValidationError::GoalNameLength { actual: len });
    }
    Ok(())
}

/// Parse and validate a goal target (integer in 1-10000).
pub fn parse_goal_target(text: &str) -> Result<i64, ValidationError> {
    let value: i64 = text.trim().parse().map_err(|_| ValidationError::NotANumber)?;
    if !(1..=MAX_GOAL_TARGET).contains(&value) {
        return Err(ValidationError::TargetOutOfRange { value });
    }
    Ok(value)
}

/// Parse and validate a progress amount (positive integer).
pub fn parse_progress_amount(text: &str) -> Result<i64, ValidationError> {
    let value: i64 = text.trim().parse().map_err(|_| ValidationError::NotANumber)?;
    if value <= 0 {
        return Err(ValidationError::AmountNotPositive { value });
    }
    Ok(value)
}
