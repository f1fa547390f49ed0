//! Sessions: the connection-level API of a database
//!
//! A session owns at most one top-level transaction. Every operation takes
//! `&mut self`, so a session is driven by one thread at a time.
//!
//! ## Autocommit
//!
//! A data operation or top-level routine call made with no open transaction
//! runs in an implicit transaction that commits on success and rolls back on
//! error. Routines always run inside a transaction, so nested calls and data
//! operations made by a routine share the caller's transaction.
//!
//! ## Termination
//!
//! Another session may terminate this one through
//! [`crate::admin::terminate_sessions`]. The next operation then rolls back
//! the open transaction and fails with `AdminShutdown`, as does every
//! operation after it.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, warn};

use dbunit_concurrency::TransactionContext;
use dbunit_core::{EngineError, EngineResult, Key, SessionId, Storage, Value};

use crate::admin::SessionInfo;
use crate::database::Database;
use crate::routine::RoutineHandle;

/// Session state visible to other sessions of the same database
pub(crate) struct SessionState {
    id: SessionId,
    started_at: DateTime<Utc>,
    terminated: AtomicBool,
    in_transaction: AtomicBool,
    /// Top-level statement currently running, if any
    statement: Mutex<Option<String>>,
}

impl SessionState {
    pub(crate) fn new(id: SessionId) -> Self {
        Self {
            id,
            started_at: Utc::now(),
            terminated: AtomicBool::new(false),
            in_transaction: AtomicBool::new(false),
            statement: Mutex::new(None),
        }
    }

    pub(crate) fn id(&self) -> SessionId {
        self.id
    }

    pub(crate) fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    /// Mark terminated; returns false if it already was
    pub(crate) fn terminate(&self) -> bool {
        !self.terminated.swap(true, Ordering::SeqCst)
    }

    pub(crate) fn statement(&self) -> Option<String> {
        self.statement.lock().clone()
    }

    fn set_statement(&self, statement: Option<String>) {
        *self.statement.lock() = statement;
    }

    fn set_in_transaction(&self, value: bool) {
        self.in_transaction.store(value, Ordering::SeqCst);
    }

    pub(crate) fn info(&self) -> SessionInfo {
        SessionInfo {
            session_id: self.id,
            started_at: self.started_at,
            in_transaction: self.in_transaction.load(Ordering::SeqCst),
            statement: self.statement(),
            terminated: self.is_terminated(),
        }
    }
}

/// A connection to a [`Database`]
///
/// Created by [`Database::connect`]. Dropping a session rolls back its open
/// transaction and removes it from the database's session table.
pub struct Session {
    db: Arc<Database>,
    state: Arc<SessionState>,
    /// Open top-level transaction
    txn: Option<TransactionContext>,
    /// Nesting of routine calls currently on the stack
    depth: usize,
}

impl Session {
    pub(crate) fn new(db: Arc<Database>, state: Arc<SessionState>) -> Self {
        Self {
            db,
            state,
            txn: None,
            depth: 0,
        }
    }

    /// Session identifier
    pub fn id(&self) -> SessionId {
        self.state.id()
    }

    /// Database this session is connected to
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// Check if a transaction is open
    pub fn in_transaction(&self) -> bool {
        self.txn.is_some()
    }

    /// Id of the open transaction
    pub fn txn_id(&self) -> Option<u64> {
        self.txn.as_ref().map(|txn| txn.txn_id)
    }

    /// Nesting of routine calls currently running
    pub fn call_depth(&self) -> usize {
        self.depth
    }

    /// Names of established savepoints, outermost first
    pub fn savepoint_names(&self) -> Vec<String> {
        self.txn
            .as_ref()
            .map(|txn| txn.savepoint_names().into_iter().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Check if an administrator terminated this session
    pub fn is_terminated(&self) -> bool {
        self.state.is_terminated()
    }

    // ========================================================================
    // Transaction control
    // ========================================================================

    /// Open a top-level transaction
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransactionState` if a transaction is already open or
    /// if called from inside a routine.
    pub fn begin(&mut self) -> EngineResult<()> {
        self.check_alive()?;
        self.ensure_top_level("BEGIN")?;
        if self.txn.is_some() {
            return Err(EngineError::invalid_transaction_state(
                "there is already a transaction in progress",
            ));
        }
        self.open_txn();
        Ok(())
    }

    /// Commit the open transaction, returning its commit version
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransactionState` if no transaction is open or if
    /// called from inside a routine.
    pub fn commit(&mut self) -> EngineResult<u64> {
        self.check_alive()?;
        self.ensure_top_level("COMMIT")?;
        let mut txn = self.take_txn()?;
        self.db.manager.commit(&mut txn, &self.db.store)
    }

    /// Roll back the open transaction
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransactionState` if no transaction is open or if
    /// called from inside a routine.
    pub fn rollback(&mut self) -> EngineResult<()> {
        self.check_alive()?;
        self.ensure_top_level("ROLLBACK")?;
        let mut txn = self.take_txn()?;
        self.db.manager.abort(&mut txn, "rollback")
    }

    fn open_txn(&mut self) {
        self.txn = Some(self.db.manager.begin(&self.db.store));
        self.state.set_in_transaction(true);
    }

    fn take_txn(&mut self) -> EngineResult<TransactionContext> {
        let txn = self.txn.take().ok_or_else(|| {
            EngineError::invalid_transaction_state("there is no transaction in progress")
        })?;
        self.state.set_in_transaction(false);
        Ok(txn)
    }

    fn ensure_top_level(&self, command: &str) -> EngineResult<()> {
        if self.depth > 0 {
            return Err(EngineError::invalid_transaction_state(format!(
                "{} is not allowed inside a routine",
                command
            )));
        }
        Ok(())
    }

    /// Close an implicit transaction according to the result it produced
    fn finish_implicit<T>(&mut self, result: EngineResult<T>) -> EngineResult<T> {
        let Some(mut txn) = self.txn.take() else {
            return result;
        };
        self.state.set_in_transaction(false);
        match result {
            Ok(value) => {
                self.db.manager.commit(&mut txn, &self.db.store)?;
                Ok(value)
            }
            Err(err) => {
                self.db.manager.abort(&mut txn, err.message.clone())?;
                Err(err)
            }
        }
    }

    /// Fail with `AdminShutdown` once terminated, rolling back first
    fn check_alive(&mut self) -> EngineResult<()> {
        if !self.state.is_terminated() {
            return Ok(());
        }
        if let Some(mut txn) = self.txn.take() {
            self.state.set_in_transaction(false);
            if let Err(e) = self.db.manager.abort(&mut txn, "session terminated") {
                warn!(target: "dbunit::session", session = %self.id(), error = %e, "Rollback of terminated session failed");
            }
        }
        Err(EngineError::admin_shutdown())
    }

    // ========================================================================
    // Routine invocation
    // ========================================================================

    /// Call a routine by name
    ///
    /// The name may be schema-qualified; otherwise the default schema is used.
    ///
    /// # Errors
    ///
    /// Returns `UndefinedFunction` if no routine has that name, and any error
    /// raised by the routine.
    pub fn call(&mut self, name: &str) -> EngineResult<Value> {
        self.check_alive()?;
        let qualified = self.db.qualify(name)?;
        let handle = self
            .db
            .catalog()
            .lookup(&qualified)
            .ok_or_else(|| EngineError::undefined_routine(&qualified))?;
        self.invoke(&handle)
    }

    /// Call a routine resolved earlier
    ///
    /// A panic inside the routine is reported as an `Internal` error.
    ///
    /// # Errors
    ///
    /// Returns `StackDepthExceeded` when calls nest deeper than
    /// `max_call_depth`, and any error raised by the routine.
    pub fn invoke(&mut self, handle: &RoutineHandle) -> EngineResult<Value> {
        self.check_alive()?;
        let limit = self.db.config().max_call_depth;
        if self.depth >= limit {
            return Err(EngineError::stack_depth_exceeded(limit));
        }
        if self.depth > 0 {
            return self.run_routine(handle);
        }

        self.state
            .set_statement(Some(format!("SELECT {}()", handle.name())));
        let implicit = self.txn.is_none();
        if implicit {
            self.open_txn();
        }
        let mut result = self.run_routine(handle);
        if implicit {
            result = self.finish_implicit(result);
        }
        self.state.set_statement(None);
        result
    }

    fn run_routine(&mut self, handle: &RoutineHandle) -> EngineResult<Value> {
        let routine = Arc::clone(handle.routine());
        self.depth += 1;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| routine.call(self)));
        self.depth -= 1;
        match outcome {
            Ok(result) => result,
            Err(payload) => Err(EngineError::internal(format!(
                "routine {}() panicked: {}",
                handle.name(),
                panic_message(payload.as_ref())
            ))),
        }
    }

    // ========================================================================
    // Data operations
    // ========================================================================

    /// Run `op` in the open transaction, or in an implicit one
    fn with_txn<T>(
        &mut self,
        op: impl FnOnce(&mut TransactionContext, &dyn Storage) -> EngineResult<T>,
    ) -> EngineResult<T> {
        self.check_alive()?;
        let db = &self.db;
        match self.txn.as_mut() {
            Some(txn) => op(txn, &db.store),
            None => {
                let mut txn = db.manager.begin(&db.store);
                match op(&mut txn, &db.store) {
                    Ok(value) => {
                        db.manager.commit(&mut txn, &db.store)?;
                        Ok(value)
                    }
                    Err(err) => {
                        db.manager.abort(&mut txn, err.message.clone())?;
                        Err(err)
                    }
                }
            }
        }
    }

    /// Read a row
    pub fn get(&mut self, table: &str, row: &str) -> EngineResult<Option<Value>> {
        let key = Key::new(table, row);
        self.with_txn(|txn, store| txn.get(&key, store))
    }

    /// Insert or overwrite a row
    pub fn put(&mut self, table: &str, row: &str, value: impl Into<Value>) -> EngineResult<()> {
        let key = Key::new(table, row);
        let value = value.into();
        self.with_txn(|txn, _| txn.put(key, value))
    }

    /// Insert a new row
    ///
    /// # Errors
    ///
    /// Returns `UniqueViolation` if the row already exists.
    pub fn insert(&mut self, table: &str, row: &str, value: impl Into<Value>) -> EngineResult<()> {
        let key = Key::new(table, row);
        let value = value.into();
        self.with_txn(|txn, store| {
            if txn.get(&key, store)?.is_some() {
                return Err(EngineError::unique_violation(&key.table, &key.row));
            }
            txn.put(key, value)
        })
    }

    /// Delete a row, returning whether it existed
    ///
    /// The delete is buffered even when the row is already absent from this
    /// session's view, so it still applies if that view is rolled back.
    pub fn delete(&mut self, table: &str, row: &str) -> EngineResult<bool> {
        let key = Key::new(table, row);
        self.with_txn(|txn, store| {
            let existed = txn.get(&key, store)?.is_some();
            txn.delete(key)?;
            Ok(existed)
        })
    }

    /// All rows of a table as (row, value), in row order
    pub fn scan(&mut self, table: &str) -> EngineResult<Vec<(String, Value)>> {
        self.with_txn(|txn, store| {
            Ok(txn
                .scan_table(table, store)?
                .into_iter()
                .map(|(key, value)| (key.row, value))
                .collect())
        })
    }

    /// Number of rows in a table
    pub fn count(&mut self, table: &str) -> EngineResult<usize> {
        self.with_txn(|txn, store| Ok(txn.scan_table(table, store)?.len()))
    }

    // ========================================================================
    // Savepoints
    // ========================================================================

    fn open_txn_mut(&mut self, command: &str) -> EngineResult<&mut TransactionContext> {
        self.check_alive()?;
        self.txn.as_mut().ok_or_else(|| outside_transaction(command))
    }

    /// Establish a savepoint in the open transaction
    pub fn savepoint(&mut self, name: &str) -> EngineResult<()> {
        self.open_txn_mut("SAVEPOINT")?.savepoint(name)
    }

    /// Undo everything done since the savepoint; the savepoint stays
    pub fn rollback_to_savepoint(&mut self, name: &str) -> EngineResult<()> {
        self.open_txn_mut("ROLLBACK TO SAVEPOINT")?
            .rollback_to_savepoint(name)
    }

    /// Forget the savepoint, keeping its changes in the transaction
    pub fn release_savepoint(&mut self, name: &str) -> EngineResult<()> {
        self.open_txn_mut("RELEASE SAVEPOINT")?.release_savepoint(name)
    }

    /// Commit the changes made since the savepoint straight to storage
    ///
    /// The savepoint is released and the transaction stays open. Published
    /// changes survive a later rollback of the transaction.
    pub fn commit_savepoint(&mut self, name: &str) -> EngineResult<u64> {
        self.check_alive()?;
        let db = &self.db;
        let txn = self
            .txn
            .as_mut()
            .ok_or_else(|| outside_transaction("COMMIT SAVEPOINT"))?;
        db.manager.publish_savepoint(txn, name, &db.store)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id())
            .field("database", &self.db.name())
            .field("txn_id", &self.txn_id())
            .field("depth", &self.depth)
            .finish()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(mut txn) = self.txn.take() {
            if let Err(e) = self.db.manager.abort(&mut txn, "session closed") {
                warn!(target: "dbunit::session", session = %self.id(), error = %e, "Rollback on disconnect failed");
            }
        }
        self.db.sessions.remove(&self.id());
        debug!(target: "dbunit::session", session = %self.id(), "Session disconnected");
    }
}

fn outside_transaction(command: &str) -> EngineError {
    EngineError::invalid_transaction_state(format!(
        "{} can only be used in transaction blocks",
        command
    ))
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic payload"
    }
}
