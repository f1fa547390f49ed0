//! Isolated units of work
//!
//! [`run_isolated`] executes a [`Statement`] so that its effects persist
//! independently of whatever the caller's transaction does afterwards, and
//! so that a failure undoes exactly the statement's own effects.
//!
//! ## Protocol
//!
//! ```text
//! 1. BEGIN if the session has no open transaction
//! 2. SAVEPOINT dbunit_boundary_N
//! 3. run every step
//! 4a. success: COMMIT SAVEPOINT (publish the changes to storage)
//! 4b. failure: ROLLBACK TO SAVEPOINT, RELEASE SAVEPOINT
//! 5. COMMIT / ROLLBACK the transaction opened in step 1
//! ```
//!
//! Published changes leave the caller's transaction buffer, so a later
//! rollback of that transaction does not undo them. Outer writes to a key
//! the statement also wrote are superseded by the published value.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing::{debug, warn};

use dbunit_core::{EngineError, EngineResult, ErrorCode, ErrorKind, HookKind};
use dbunit_engine::{RoutineHandle, Session};

use crate::condition;

/// Counter making savepoint names unique within the process
static BOUNDARY_SEQ: AtomicU64 = AtomicU64::new(1);

/// One step of a statement
#[derive(Debug, Clone)]
pub enum Step {
    /// Call a routine, ignoring its result
    Call(RoutineHandle),
    /// Run a boolean hook through the condition evaluator
    Check {
        /// Hook category, used in the failure message
        kind: HookKind,
        /// The boolean routine
        hook: RoutineHandle,
    },
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Call(handle) => write!(f, "SELECT {}()", handle.name()),
            Step::Check { kind, hook } => write!(f, "CHECK {} {}()", kind, hook.name()),
        }
    }
}

/// An ordered list of steps executed as one isolated unit of work
#[derive(Debug, Clone, Default)]
pub struct Statement {
    steps: Vec<Step>,
}

impl Statement {
    /// Create an empty statement
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a routine call
    pub fn call(mut self, handle: RoutineHandle) -> Self {
        self.steps.push(Step::Call(handle));
        self
    }

    /// Append a condition check
    pub fn check(mut self, kind: HookKind, hook: RoutineHandle) -> Self {
        self.steps.push(Step::Check { kind, hook });
        self
    }

    /// Steps in execution order
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Check if the statement has no steps
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", step)?;
        }
        Ok(())
    }
}

/// Failure of an isolated statement
///
/// Keeps the original error's code, so its [`ErrorKind`] still tells an
/// assertion failure from an environment error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{statement} failed: {message}{}", render_detail(.detail))]
pub struct FailureEnvelope {
    /// Code of the original error
    pub code: ErrorCode,
    /// Rendered statement that was executed
    pub statement: String,
    /// Message of the original error
    pub message: String,
    /// Detail of the original error
    pub detail: Option<String>,
    /// Hint of the original error
    pub hint: Option<String>,
}

fn render_detail(detail: &Option<String>) -> String {
    match detail {
        Some(detail) => format!("\nDETAIL: {}", detail),
        None => String::new(),
    }
}

impl FailureEnvelope {
    /// Wrap an error raised while running `statement`
    pub fn capture(error: EngineError, statement: impl Into<String>) -> Self {
        Self {
            code: error.code,
            statement: statement.into(),
            message: error.message,
            detail: error.detail,
            hint: error.hint,
        }
    }

    /// Kind of the original error
    pub fn kind(&self) -> ErrorKind {
        self.code.kind()
    }

    /// Whether the original error was the failure signal
    pub fn is_assertion_failure(&self) -> bool {
        self.kind() == ErrorKind::AssertionFailure
    }

    /// Re-raise as an error carrying the full diagnostic text
    pub fn into_error(self) -> EngineError {
        let message = self.to_string();
        let error = EngineError::new(self.code, message);
        match self.hint {
            Some(hint) => error.with_hint(hint),
            None => error,
        }
    }
}

/// Run `work` as an isolated, independently committed unit of work
///
/// # Errors
///
/// Returns a [`FailureEnvelope`] for the first error raised by any step, or
/// by the transaction control around them. No effect of `work` remains.
pub fn run_isolated(session: &mut Session, work: &Statement) -> Result<(), FailureEnvelope> {
    let statement = work.to_string();
    let owns_txn = !session.in_transaction();
    if owns_txn {
        session
            .begin()
            .map_err(|e| FailureEnvelope::capture(e, statement.as_str()))?;
    }

    let savepoint = format!(
        "dbunit_boundary_{}",
        BOUNDARY_SEQ.fetch_add(1, Ordering::Relaxed)
    );
    debug!(target: "dbunit::isolation", %savepoint, %statement, "Entering isolation boundary");

    let result = session.savepoint(&savepoint).and_then(|()| {
        let published = execute(session, work)
            .and_then(|()| session.commit_savepoint(&savepoint).map(|_| ()));
        if published.is_err() {
            undo(session, &savepoint);
        }
        published
    });

    if owns_txn {
        close(session, result.is_ok());
    }

    match result {
        Ok(()) => {
            debug!(target: "dbunit::isolation", %savepoint, "Isolation boundary published");
            Ok(())
        }
        Err(err) => {
            debug!(
                target: "dbunit::isolation",
                %savepoint,
                code = err.code.sqlstate(),
                "Isolation boundary rolled back"
            );
            Err(FailureEnvelope::capture(err, statement))
        }
    }
}

fn execute(session: &mut Session, work: &Statement) -> EngineResult<()> {
    for step in work.steps() {
        match step {
            Step::Call(handle) => {
                session.invoke(handle)?;
            }
            Step::Check { kind, hook } => condition::check(session, *kind, hook)?,
        }
    }
    Ok(())
}

/// Undo the boundary after a failure; the original error wins over any
/// error raised here
fn undo(session: &mut Session, savepoint: &str) {
    let undone = session
        .rollback_to_savepoint(savepoint)
        .and_then(|()| session.release_savepoint(savepoint));
    if let Err(e) = undone {
        debug!(target: "dbunit::isolation", %savepoint, error = %e, "Savepoint cleanup skipped");
    }
}

/// Close the transaction opened for the boundary
fn close(session: &mut Session, commit: bool) {
    if !session.in_transaction() {
        return;
    }
    let closed = if commit {
        session.commit().map(|_| ())
    } else {
        session.rollback()
    };
    if let Err(e) = closed {
        warn!(target: "dbunit::isolation", error = %e, "Closing boundary transaction failed");
    }
}
