//! Structured error types for rollup operations.

use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    UnsupportedField,
    InvalidFieldValue,

    // Not found errors
    TaskNotFound,
    SerialNotFound,

    // Internal errors
    InternalError,
}

/// Structured error returned by every fallible public operation.
#[derive(Debug, Serialize)]
pub struct RollupError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl RollupError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
            details: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors

    /// An outline anchor (task name or serial field) that no record carries.
    pub fn task_not_found(key: &str) -> Self {
        Self::new(ErrorCode::TaskNotFound, format!("Task not found: {}", key))
    }

    /// A record id with no record behind it.
    pub fn id_not_found(id: u32) -> Self {
        Self::new(ErrorCode::TaskNotFound, format!("No task with id {}", id))
    }

    pub fn serial_not_found(serial: &str) -> Self {
        Self::new(
            ErrorCode::SerialNotFound,
            format!("Serial number not found: {}", serial),
        )
    }

    pub fn unsupported_field(name: &str, accepted: &[&str]) -> Self {
        Self::new(
            ErrorCode::UnsupportedField,
            format!("Unknown or unsupported field: {}", name),
        )
        .with_field(name)
        .with_details(format!("accepted fields: {}", accepted.join(", ")))
    }

    pub fn invalid_value(field: &str, reason: &str) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, reason).with_field(field)
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }
}

impl fmt::Display for RollupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RollupError {}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for RollupError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<RollupError>() {
            Ok(rollup_err) => rollup_err,
            Err(err) => RollupError::internal(err),
        }
    }
}

/// Result type for rollup operations.
pub type RollupResult<T> = std::result::Result<T, RollupError>;
