//! Assertion helpers for test routines
//!
//! Every helper raises `ErrorCode::AssertionFailure` on violation, which the
//! suite executor classifies as `FAILED`. Comparisons follow three-valued
//! logic: an unknown result (a `NULL` operand) is not a violation.
//!
//! ```text
//! db.register_routine("test_case_stock_level", |s: &mut Session| {
//!     let level = s.get("stock", "widget")?;
//!     assert_equals_msg("widget stock", 3, level)?;
//!     Ok(Value::Null)
//! })?;
//! ```

use dbunit_core::{EngineError, EngineResult, Value};

/// Fail unconditionally
pub fn fail<T>(message: &str) -> EngineResult<T> {
    Err(EngineError::assertion_failure(message))
}

/// Assert that a condition is true
pub fn assert_true(condition: impl Into<Value>) -> EngineResult<()> {
    check_bool(condition.into(), true, None)
}

/// Assert that a condition is true, with a caller message
pub fn assert_true_msg(message: &str, condition: impl Into<Value>) -> EngineResult<()> {
    check_bool(condition.into(), true, Some(message))
}

/// Assert that a condition is false
pub fn assert_false(condition: impl Into<Value>) -> EngineResult<()> {
    check_bool(condition.into(), false, None)
}

/// Assert that a condition is false, with a caller message
pub fn assert_false_msg(message: &str, condition: impl Into<Value>) -> EngineResult<()> {
    check_bool(condition.into(), false, Some(message))
}

/// Assert that a value is not NULL
pub fn assert_not_null(value: impl Into<Value>) -> EngineResult<()> {
    assert_not_null_msg("value is NULL", value)
}

/// Assert that a value is not NULL, with a caller message
pub fn assert_not_null_msg(message: &str, value: impl Into<Value>) -> EngineResult<()> {
    if value.into().is_null() {
        return fail(message);
    }
    Ok(())
}

/// Assert that a value is NULL
pub fn assert_null(value: impl Into<Value>) -> EngineResult<()> {
    let value = value.into();
    if value.is_null() {
        return Ok(());
    }
    fail(&format!("expected NULL but got {}", value))
}

/// Assert that a value is NULL, with a caller message
pub fn assert_null_msg(message: &str, value: impl Into<Value>) -> EngineResult<()> {
    if value.into().is_null() {
        Ok(())
    } else {
        fail(message)
    }
}

/// Assert that two values are equal
///
/// # Errors
///
/// Raises the failure signal when the values differ, and `DatatypeMismatch`
/// when they cannot be compared.
pub fn assert_equals(expected: impl Into<Value>, actual: impl Into<Value>) -> EngineResult<()> {
    check_equals(None, expected.into(), actual.into())
}

/// Assert that two values are equal, with a caller message
pub fn assert_equals_msg(
    message: &str,
    expected: impl Into<Value>,
    actual: impl Into<Value>,
) -> EngineResult<()> {
    check_equals(Some(message), expected.into(), actual.into())
}

fn check_equals(message: Option<&str>, expected: Value, actual: Value) -> EngineResult<()> {
    if expected.sql_ne(&actual)? != Some(true) {
        return Ok(());
    }
    let diff = format!("expected {} but got {}", expected, actual);
    match message {
        Some(message) => fail(&format!("{}: {}", message, diff)),
        None => fail(&diff),
    }
}

fn check_bool(condition: Value, expected: bool, message: Option<&str>) -> EngineResult<()> {
    match condition {
        Value::Null => Ok(()),
        Value::Bool(b) if b == expected => Ok(()),
        Value::Bool(_) => fail(message.unwrap_or(if expected {
            "condition is false"
        } else {
            "condition is true"
        })),
        other => Err(EngineError::datatype_mismatch(format!(
            "argument of assertion must be type boolean, not type {}",
            other.type_name()
        ))),
    }
}
