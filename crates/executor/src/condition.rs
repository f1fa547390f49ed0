//! Boolean hook evaluation
//!
//! Preconditions and postconditions are routines returning a boolean. A
//! `false` result is turned into the same failure signal an assertion
//! raises, so the classifier cannot tell the two apart.

use dbunit_core::{EngineError, EngineResult, HookKind, Value};
use dbunit_engine::{RoutineHandle, Session};
use tracing::debug;

/// Run a boolean hook and fail on `false`
///
/// `NULL` is not `false` and passes.
///
/// # Errors
///
/// Raises the failure signal naming the hook when it returns `false`,
/// `DatatypeMismatch` when it returns a non-boolean, and any error raised
/// by the hook itself.
pub fn check(session: &mut Session, kind: HookKind, hook: &RoutineHandle) -> EngineResult<()> {
    let value = session.invoke(hook)?;
    debug!(target: "dbunit::suite", %kind, hook = %hook.name(), result = %value, "Condition evaluated");
    match value {
        Value::Bool(true) | Value::Null => Ok(()),
        Value::Bool(false) => Err(EngineError::assertion_failure(format!(
            "{} {}() returned false",
            kind,
            hook.name()
        ))),
        other => Err(EngineError::datatype_mismatch(format!(
            "{} {}() must return boolean, not {}",
            kind,
            hook.name(),
            other.type_name()
        ))),
    }
}

/// Run a boolean hook if one was resolved
pub fn check_optional(
    session: &mut Session,
    kind: HookKind,
    hook: Option<&RoutineHandle>,
) -> EngineResult<()> {
    match hook {
        Some(hook) => check(session, kind, hook),
        None => Ok(()),
    }
}
