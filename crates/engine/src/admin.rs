//! Session administration
//!
//! Lists the sessions connected to a database and terminates them. Used by
//! test harnesses to clear sessions left behind by an aborted run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use dbunit_core::{EngineError, EngineResult, SessionId};

use crate::database;
use crate::session::Session;

/// Snapshot of one connected session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    /// Session identifier
    pub session_id: SessionId,
    /// When the session connected
    pub started_at: DateTime<Utc>,
    /// Whether a transaction is open
    pub in_transaction: bool,
    /// Top-level statement currently running, if any
    pub statement: Option<String>,
    /// Whether the session has been terminated
    pub terminated: bool,
}

/// A session stopped by [`terminate_sessions`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerminatedSession {
    /// Session identifier
    pub session_id: SessionId,
    /// Statement the session was running when it was terminated
    pub statement: Option<String>,
}

/// Terminate every session of the named database except the caller
///
/// A terminated session rolls back its open transaction at its next
/// operation and fails every operation with `AdminShutdown`. Sessions that
/// were already terminated are not reported again.
///
/// # Errors
///
/// Returns `UndefinedObject` if no database of that name is open.
pub fn terminate_sessions(
    caller: &Session,
    database_name: &str,
) -> EngineResult<Vec<TerminatedSession>> {
    let db = database::lookup(database_name)
        .ok_or_else(|| EngineError::undefined_object("database", database_name))?;

    let mut terminated: Vec<TerminatedSession> = db
        .sessions
        .iter()
        .filter(|entry| *entry.key() != caller.id())
        .filter(|entry| entry.value().terminate())
        .map(|entry| TerminatedSession {
            session_id: entry.value().id(),
            statement: entry.value().statement(),
        })
        .collect();
    terminated.sort_by_key(|t| t.session_id);

    for t in &terminated {
        warn!(
            target: "dbunit::session",
            database = database_name,
            session = %t.session_id,
            statement = t.statement.as_deref().unwrap_or(""),
            "Session terminated by administrator"
        );
    }
    Ok(terminated)
}
