//! Error types shared by every tabula subsystem
//!
//! Error codes:
//! - TABULA_INVALID_ARGUMENT (REJECT)
//! - TABULA_UNSUPPORTED_OPERATION (REJECT)
//! - TABULA_INVALID_STATE (ERROR)
//!
//! All errors are raised at the offending call. Nothing is retried
//! internally. A query that matches nothing is not an error.

use std::fmt;

/// Severity levels for tabula errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Caller mistake, request rejected
    Reject,
    /// Handle no longer backed by live data
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Unknown field, mismatched literal or accessor type, malformed sort
    InvalidArgument,
    /// Structurally invalid predicate (dangling not, unbalanced groups)
    UnsupportedOperation,
    /// Access through a row or result whose backing data is gone
    InvalidState,
}

impl ErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::InvalidArgument => "TABULA_INVALID_ARGUMENT",
            ErrorCode::UnsupportedOperation => "TABULA_UNSUPPORTED_OPERATION",
            ErrorCode::InvalidState => "TABULA_INVALID_STATE",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            ErrorCode::InvalidState => Severity::Error,
            _ => Severity::Reject,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Error type with full context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbError {
    code: ErrorCode,
    message: String,
    field: Option<String>,
}

impl DbError {
    /// Create an invalid argument error
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::InvalidArgument,
            message: reason.into(),
            field: None,
        }
    }

    /// Create an unknown field error naming the field and its table
    pub fn unknown_field(field: impl Into<String>, table: &str) -> Self {
        let f = field.into();
        Self {
            code: ErrorCode::InvalidArgument,
            message: format!("Field '{}' does not exist in table '{}'", f, table),
            field: Some(f),
        }
    }

    /// Create a type mismatch error for a field
    pub fn type_mismatch(field: impl Into<String>, reason: impl Into<String>) -> Self {
        let f = field.into();
        Self {
            code: ErrorCode::InvalidArgument,
            message: format!("Field '{}': {}", f, reason.into()),
            field: Some(f),
        }
    }

    /// Create an unsupported operation error
    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::UnsupportedOperation,
            message: reason.into(),
            field: None,
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(reason: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::InvalidState,
            message: reason.into(),
            field: None,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the field name if applicable
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn is_invalid_argument(&self) -> bool {
        self.code == ErrorCode::InvalidArgument
    }

    pub fn is_unsupported(&self) -> bool {
        self.code == ErrorCode::UnsupportedOperation
    }

    pub fn is_invalid_state(&self) -> bool {
        self.code == ErrorCode::InvalidState
    }
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for DbError {}

/// Result type for tabula operations
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ErrorCode::InvalidArgument.code(), "TABULA_INVALID_ARGUMENT");
        assert_eq!(
            ErrorCode::UnsupportedOperation.code(),
            "TABULA_UNSUPPORTED_OPERATION"
        );
        assert_eq!(ErrorCode::InvalidState.code(), "TABULA_INVALID_STATE");
    }

    #[test]
    fn test_severity_mapping() {
        assert_eq!(ErrorCode::InvalidArgument.severity(), Severity::Reject);
        assert_eq!(ErrorCode::UnsupportedOperation.severity(), Severity::Reject);
        assert_eq!(ErrorCode::InvalidState.severity(), Severity::Error);
    }

    #[test]
    fn test_unknown_field_names_field_and_table() {
        let err = DbError::unknown_field("NotAField", "AllTypes");
        assert!(err.is_invalid_argument());
        assert_eq!(err.field(), Some("NotAField"));
        assert!(err.message().contains("NotAField"));
        assert!(err.message().contains("AllTypes"));
    }

    #[test]
    fn test_error_display() {
        let err = DbError::invalid_state("row 4 was deleted");
        let display = format!("{}", err);
        assert!(display.contains("TABULA_INVALID_STATE"));
        assert!(display.contains("ERROR"));
        assert!(display.contains("row 4 was deleted"));
    }
}
