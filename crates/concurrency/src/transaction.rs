//! Transaction context with savepoints
//!
//! TransactionContext buffers every write of a session's top-level
//! transaction until commit. Savepoints capture the buffered state so that
//! part of the transaction can be undone, released, or split off and
//! committed on its own.
//!
//! # Read-Your-Writes Semantics
//!
//! When reading a key, the transaction checks in order:
//! 1. **write_set**: uncommitted write from this transaction
//! 2. **delete_set**: uncommitted delete from this transaction
//! 3. **storage**: latest committed value
//!
//! Reads go to live storage rather than a snapshot, so rows committed by
//! other sessions (or published from a savepoint) are visible immediately.

use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

use dbunit_core::{EngineError, EngineResult, Key, Storage, Value, WriteBatch};

/// Summary of pending operations that would be rolled back on abort
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingOperations {
    /// Number of pending put operations
    pub puts: usize,
    /// Number of pending delete operations
    pub deletes: usize,
}

impl PendingOperations {
    /// Total number of pending operations
    pub fn total(&self) -> usize {
        self.puts + self.deletes
    }

    /// Check if there are no pending operations
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Status of a transaction in its lifecycle
///
/// State transitions:
/// - `Active` → `Committed`
/// - `Active` → `Aborted` (rollback or error)
///
/// Terminal states (no transitions allowed):
/// - `Committed`
/// - `Aborted`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Transaction is executing, can read/write
    Active,
    /// Transaction committed successfully
    Committed,
    /// Transaction was aborted
    Aborted {
        /// Human-readable reason for abort
        reason: String,
    },
}

/// Buffered state captured when a savepoint is established
#[derive(Debug, Clone)]
struct Savepoint {
    name: String,
    write_set: BTreeMap<Key, Value>,
    delete_set: BTreeSet<Key>,
    /// Keys written or deleted while this was the innermost savepoint
    touched: BTreeSet<Key>,
}

/// Transaction context for a session's top-level transaction
///
/// # Lifecycle
///
/// 1. **BEGIN**: created by `TransactionManager::begin`, status is `Active`
/// 2. **READ/WRITE**: `get()`, `scan_table()`, `put()`, `delete()`
/// 3. **SAVEPOINTS**: `savepoint()`, `rollback_to_savepoint()`,
///    `release_savepoint()`, `split_savepoint()`
/// 4. **COMMIT/ABORT**: `mark_committed()` or `mark_aborted()`
pub struct TransactionContext {
    /// Unique transaction ID
    pub txn_id: u64,
    /// Storage version when the transaction started
    pub start_version: u64,
    /// Keys written with their new values (buffered)
    write_set: BTreeMap<Key, Value>,
    /// Keys to delete (buffered)
    delete_set: BTreeSet<Key>,
    /// Savepoint stack, innermost last
    savepoints: Vec<Savepoint>,
    /// Current transaction status
    pub status: TransactionStatus,
    /// When this transaction was created
    start_time: Instant,
}

impl TransactionContext {
    /// Create a new active transaction context
    pub fn new(txn_id: u64, start_version: u64) -> Self {
        TransactionContext {
            txn_id,
            start_version,
            write_set: BTreeMap::new(),
            delete_set: BTreeSet::new(),
            savepoints: Vec::new(),
            status: TransactionStatus::Active,
            start_time: Instant::now(),
        }
    }

    // === Read Operations ===

    /// Get a value from the transaction's view
    ///
    /// # Errors
    /// Returns `InvalidTransactionState` if the transaction is not active.
    pub fn get(&self, key: &Key, store: &dyn Storage) -> EngineResult<Option<Value>> {
        self.ensure_active()?;

        if let Some(value) = self.write_set.get(key) {
            return Ok(Some(value.clone()));
        }
        if self.delete_set.contains(key) {
            return Ok(None);
        }
        Ok(store.get(key).map(|v| v.value))
    }

    /// All rows of a table in the transaction's view, in row order
    ///
    /// # Errors
    /// Returns `InvalidTransactionState` if the transaction is not active.
    pub fn scan_table(&self, table: &str, store: &dyn Storage) -> EngineResult<Vec<(Key, Value)>> {
        self.ensure_active()?;

        let mut rows: BTreeMap<Key, Value> = store
            .scan_table(table)
            .into_iter()
            .filter(|(key, _)| !self.delete_set.contains(key))
            .map(|(key, versioned)| (key, versioned.value))
            .collect();

        for (key, value) in &self.write_set {
            if key.in_table(table) {
                rows.insert(key.clone(), value.clone());
            }
        }

        Ok(rows.into_iter().collect())
    }

    // === Write Operations ===

    /// Buffer a write operation
    ///
    /// # Errors
    /// Returns `InvalidTransactionState` if the transaction is not active.
    pub fn put(&mut self, key: Key, value: Value) -> EngineResult<()> {
        self.ensure_active()?;
        self.touch(&key);
        self.delete_set.remove(&key);
        self.write_set.insert(key, value);
        Ok(())
    }

    /// Buffer a delete operation
    ///
    /// # Errors
    /// Returns `InvalidTransactionState` if the transaction is not active.
    pub fn delete(&mut self, key: Key) -> EngineResult<()> {
        self.ensure_active()?;
        self.touch(&key);
        self.write_set.remove(&key);
        self.delete_set.insert(key);
        Ok(())
    }

    fn touch(&mut self, key: &Key) {
        if let Some(innermost) = self.savepoints.last_mut() {
            innermost.touched.insert(key.clone());
        }
    }

    // === Savepoints ===

    /// Establish a savepoint capturing the current buffered state
    ///
    /// Reusing a name shadows the earlier savepoint of that name.
    ///
    /// # Errors
    /// Returns `InvalidParameter` for an empty name and
    /// `InvalidTransactionState` if the transaction is not active.
    pub fn savepoint(&mut self, name: &str) -> EngineResult<()> {
        self.ensure_active()?;
        if name.is_empty() {
            return Err(EngineError::invalid_parameter("savepoint name must not be empty"));
        }
        self.savepoints.push(Savepoint {
            name: name.to_string(),
            write_set: self.write_set.clone(),
            delete_set: self.delete_set.clone(),
            touched: BTreeSet::new(),
        });
        Ok(())
    }

    /// Undo everything buffered since the savepoint
    ///
    /// The savepoint itself stays established; savepoints created after it
    /// are discarded.
    ///
    /// # Errors
    /// Returns `InvalidSavepoint` if no savepoint has that name.
    pub fn rollback_to_savepoint(&mut self, name: &str) -> EngineResult<()> {
        self.ensure_active()?;
        let pos = self.find_savepoint(name)?;
        self.savepoints.truncate(pos + 1);
        let sp = &mut self.savepoints[pos];
        sp.touched.clear();
        self.write_set = sp.write_set.clone();
        self.delete_set = sp.delete_set.clone();
        Ok(())
    }

    /// Drop the savepoint and every savepoint created after it
    ///
    /// Buffered changes are kept as part of the enclosing transaction.
    ///
    /// # Errors
    /// Returns `InvalidSavepoint` if no savepoint has that name.
    pub fn release_savepoint(&mut self, name: &str) -> EngineResult<()> {
        self.ensure_active()?;
        let pos = self.find_savepoint(name)?;
        let touched = self.drain_touched(pos);
        if let Some(enclosing) = self.savepoints.last_mut() {
            enclosing.touched.extend(touched);
        }
        Ok(())
    }

    /// Split off the changes buffered since the savepoint
    ///
    /// Every key written or deleted since the savepoint is part of the batch,
    /// even when the enclosing transaction already held the same value. The
    /// keys are removed from this transaction, including from the state
    /// captured by enclosing savepoints, so that neither a later rollback nor
    /// a later commit of this transaction touches them again. The savepoint
    /// and the savepoints created after it are released.
    ///
    /// # Errors
    /// Returns `InvalidSavepoint` if no savepoint has that name.
    pub fn split_savepoint(&mut self, name: &str) -> EngineResult<WriteBatch> {
        self.ensure_active()?;
        let pos = self.find_savepoint(name)?;
        let touched = self.drain_touched(pos);

        let mut batch = WriteBatch::new();
        for key in touched {
            if let Some(value) = self.write_set.remove(&key) {
                batch.puts.push((key.clone(), value));
            } else if self.delete_set.remove(&key) {
                batch.deletes.push(key.clone());
            }
            for outer in &mut self.savepoints {
                outer.write_set.remove(&key);
                outer.delete_set.remove(&key);
                outer.touched.remove(&key);
            }
        }

        Ok(batch)
    }

    /// Drop the savepoint at `pos` and those after it, returning the keys
    /// they touched
    fn drain_touched(&mut self, pos: usize) -> BTreeSet<Key> {
        self.savepoints
            .drain(pos..)
            .flat_map(|sp| sp.touched)
            .collect()
    }

    /// Number of established savepoints
    pub fn savepoint_depth(&self) -> usize {
        self.savepoints.len()
    }

    /// Names of established savepoints, outermost first
    pub fn savepoint_names(&self) -> Vec<&str> {
        self.savepoints.iter().map(|sp| sp.name.as_str()).collect()
    }

    fn find_savepoint(&self, name: &str) -> EngineResult<usize> {
        self.savepoints
            .iter()
            .rposition(|sp| sp.name == name)
            .ok_or_else(|| EngineError::invalid_savepoint(name))
    }

    // === State ===

    /// Check if transaction is active
    pub fn is_active(&self) -> bool {
        matches!(self.status, TransactionStatus::Active)
    }

    /// Check if transaction is committed
    pub fn is_committed(&self) -> bool {
        matches!(self.status, TransactionStatus::Committed)
    }

    /// Check if transaction is aborted
    pub fn is_aborted(&self) -> bool {
        matches!(self.status, TransactionStatus::Aborted { .. })
    }

    /// Time since the transaction began
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Check if transaction can accept operations
    ///
    /// # Errors
    /// Returns `InvalidTransactionState` if transaction is not in `Active` state.
    pub fn ensure_active(&self) -> EngineResult<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(EngineError::invalid_transaction_state(format!(
                "transaction {} is not active: {:?}",
                self.txn_id, self.status
            )))
        }
    }

    /// Summary of buffered operations
    pub fn pending_operations(&self) -> PendingOperations {
        PendingOperations {
            puts: self.write_set.len(),
            deletes: self.delete_set.len(),
        }
    }

    /// Move every buffered operation into a batch
    pub fn take_write_batch(&mut self) -> WriteBatch {
        let write_set = std::mem::take(&mut self.write_set);
        let delete_set = std::mem::take(&mut self.delete_set);
        WriteBatch {
            puts: write_set.into_iter().collect(),
            deletes: delete_set.into_iter().collect(),
        }
    }

    /// Transition to Committed state
    ///
    /// # Errors
    /// Returns `InvalidTransactionState` if not in `Active` state.
    pub fn mark_committed(&mut self) -> EngineResult<()> {
        self.ensure_active()?;
        self.status = TransactionStatus::Committed;
        self.savepoints.clear();
        Ok(())
    }

    /// Transition to Aborted state, discarding all buffered operations
    ///
    /// # Errors
    /// Returns `InvalidTransactionState` if already committed or aborted.
    pub fn mark_aborted(&mut self, reason: String) -> EngineResult<()> {
        self.ensure_active()?;
        self.status = TransactionStatus::Aborted { reason };
        self.write_set.clear();
        self.delete_set.clear();
        self.savepoints.clear();
        Ok(())
    }
}
