//! Error types for dbunit
//!
//! Every failure raised by the host engine, by a routine, or by an assertion
//! is an [`EngineError`]. The error carries an [`ErrorCode`]; the code alone
//! decides the [`ErrorKind`], which is what the suite executor uses to tell
//! an assertion failure apart from an environment failure.
//!
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use crate::types::QualifiedName;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias for engine operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Classification of an error for outcome reporting
///
/// | Kind | Raised by |
/// |------|-----------|
/// | `AssertionFailure` | assertion helpers, `fail`, false pre/postconditions |
/// | `Environment` | everything else |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The test's own logic reported a violation
    AssertionFailure,
    /// Something in the environment broke
    Environment,
}

/// Error codes raised by the engine
///
/// Codes map onto SQLSTATE values so diagnostics read the way database
/// users expect them to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Assertion or condition violation (the failure signal)
    AssertionFailure,
    /// Routine raised an explicit exception
    RaiseException,
    /// Called routine does not exist
    UndefinedFunction,
    /// Referenced object (database, schema) does not exist
    UndefinedObject,
    /// Operand types are incompatible
    DatatypeMismatch,
    /// Row already exists
    UniqueViolation,
    /// Arithmetic division by zero
    DivisionByZero,
    /// Bad argument or configuration value
    InvalidParameter,
    /// Transaction control used in the wrong state
    InvalidTransactionState,
    /// Savepoint does not exist
    InvalidSavepoint,
    /// Nested call depth exceeded
    StackDepthExceeded,
    /// Session was terminated by an administrator
    AdminShutdown,
    /// Internal error (bug or routine panic)
    Internal,
}

impl ErrorCode {
    /// SQLSTATE code for this error
    pub fn sqlstate(&self) -> &'static str {
        match self {
            ErrorCode::AssertionFailure => "P0004",
            ErrorCode::RaiseException => "P0001",
            ErrorCode::UndefinedFunction => "42883",
            ErrorCode::UndefinedObject => "42704",
            ErrorCode::DatatypeMismatch => "42804",
            ErrorCode::UniqueViolation => "23505",
            ErrorCode::DivisionByZero => "22012",
            ErrorCode::InvalidParameter => "22023",
            ErrorCode::InvalidTransactionState => "25000",
            ErrorCode::InvalidSavepoint => "3B001",
            ErrorCode::StackDepthExceeded => "54001",
            ErrorCode::AdminShutdown => "57P01",
            ErrorCode::Internal => "XX000",
        }
    }

    /// Outcome classification of this code
    pub fn kind(&self) -> ErrorKind {
        match self {
            ErrorCode::AssertionFailure => ErrorKind::AssertionFailure,
            _ => ErrorKind::Environment,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sqlstate())
    }
}

/// Error raised by the engine, a routine, or an assertion
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct EngineError {
    /// Error code; decides the error kind
    pub code: ErrorCode,
    /// Primary human-readable message
    pub message: String,
    /// Optional secondary detail
    pub detail: Option<String>,
    /// Optional suggestion for the user
    pub hint: Option<String>,
}

impl EngineError {
    /// Create an error with an explicit code
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            detail: None,
            hint: None,
        }
    }

    /// Attach a detail line
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Attach a hint
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Classification of this error
    pub fn kind(&self) -> ErrorKind {
        self.code.kind()
    }

    /// Whether this error is the failure signal
    pub fn is_assertion_failure(&self) -> bool {
        self.kind() == ErrorKind::AssertionFailure
    }

    // ==================== Constructors ====================

    /// Assertion or condition violation
    ///
    /// The message is prefixed with `Assertion failure` so reports read the
    /// same whichever helper raised it.
    pub fn assertion_failure(message: impl AsRef<str>) -> Self {
        Self::new(
            ErrorCode::AssertionFailure,
            format!("Assertion failure: {}", message.as_ref()),
        )
    }

    /// Explicit exception raised by a routine
    pub fn raise(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RaiseException, message)
    }

    /// Called routine is not in the catalog
    pub fn undefined_routine(name: &QualifiedName) -> Self {
        Self::new(
            ErrorCode::UndefinedFunction,
            format!("routine {}() does not exist", name),
        )
        .with_hint("No routine matches the given name. Register it before calling it.")
    }

    /// Referenced object does not exist
    pub fn undefined_object(what: &str, name: &str) -> Self {
        Self::new(
            ErrorCode::UndefinedObject,
            format!("{} \"{}\" does not exist", what, name),
        )
    }

    /// Incompatible operand types
    pub fn datatype_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatatypeMismatch, message)
    }

    /// Duplicate row on insert
    pub fn unique_violation(table: &str, row: &str) -> Self {
        Self::new(
            ErrorCode::UniqueViolation,
            format!("duplicate key value violates unique constraint on \"{}\"", table),
        )
        .with_detail(format!("Key (row)=({}) already exists.", row))
    }

    /// Division by zero
    pub fn division_by_zero() -> Self {
        Self::new(ErrorCode::DivisionByZero, "division by zero")
    }

    /// Bad argument or configuration value
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParameter, message)
    }

    /// Transaction control used in the wrong state
    pub fn invalid_transaction_state(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidTransactionState, message)
    }

    /// Savepoint does not exist
    pub fn invalid_savepoint(name: &str) -> Self {
        Self::new(
            ErrorCode::InvalidSavepoint,
            format!("savepoint \"{}\" does not exist", name),
        )
    }

    /// Nested call depth exceeded
    pub fn stack_depth_exceeded(limit: usize) -> Self {
        Self::new(ErrorCode::StackDepthExceeded, "stack depth limit exceeded")
            .with_detail(format!("max_call_depth is {}", limit))
    }

    /// Session was terminated by an administrator
    pub fn admin_shutdown() -> Self {
        Self::new(
            ErrorCode::AdminShutdown,
            "terminating connection due to administrator command",
        )
    }

    /// Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }
}
