//! Transaction manager for coordinating commit operations
//!
//! Provides atomic commit by orchestrating:
//! 1. State transition (Active → Committed)
//! 2. Storage application (visibility)
//!
//! Savepoint publication follows the same path for a slice of a
//! transaction: the changes made since the savepoint are split off and
//! applied to storage while the enclosing transaction stays active.
//!
//! ## Commit Sequence
//!
//! ```text
//! 1. mark_committed() - Change state to Committed
//! 2. take_write_batch() - Drain buffered writes and deletes
//! 3. store.apply() - One commit version for the whole batch
//! 4. Return Ok(commit_version)
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing::debug;

use dbunit_core::{EngineResult, Storage};

use crate::TransactionContext;

/// Counters describing transaction activity since startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransactionMetrics {
    /// Transactions begun
    pub started: u64,
    /// Transactions committed
    pub committed: u64,
    /// Transactions aborted
    pub aborted: u64,
    /// Savepoints published ahead of their transaction
    pub published: u64,
}

/// Manages transaction lifecycle and atomic commits
pub struct TransactionManager {
    /// Next transaction ID
    next_txn_id: AtomicU64,
    started: AtomicU64,
    committed: AtomicU64,
    aborted: AtomicU64,
    published: AtomicU64,
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionManager {
    /// Create a new transaction manager
    pub fn new() -> Self {
        TransactionManager {
            next_txn_id: AtomicU64::new(1),
            started: AtomicU64::new(0),
            committed: AtomicU64::new(0),
            aborted: AtomicU64::new(0),
            published: AtomicU64::new(0),
        }
    }

    /// Allocate next transaction ID
    pub fn next_txn_id(&self) -> u64 {
        self.next_txn_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Begin a new transaction against the store's current version
    pub fn begin(&self, store: &dyn Storage) -> TransactionContext {
        let txn_id = self.next_txn_id();
        let start_version = store.current_version();
        self.started.fetch_add(1, Ordering::Relaxed);
        debug!(target: "dbunit::txn", txn_id, start_version, "Transaction started");
        TransactionContext::new(txn_id, start_version)
    }

    /// Commit a transaction atomically
    ///
    /// # Returns
    /// The commit version. A transaction with no buffered operations returns
    /// the store's current version without allocating a new one.
    ///
    /// # Errors
    /// Returns `InvalidTransactionState` if the transaction is not active.
    pub fn commit(&self, txn: &mut TransactionContext, store: &dyn Storage) -> EngineResult<u64> {
        txn.mark_committed()?;
        let batch = txn.take_write_batch();
        let ops = batch.len();
        let version = store.apply(batch);
        self.committed.fetch_add(1, Ordering::Relaxed);
        debug!(
            target: "dbunit::txn",
            txn_id = txn.txn_id,
            version,
            ops,
            duration_us = txn.elapsed().as_micros() as u64,
            "Transaction committed"
        );
        Ok(version)
    }

    /// Abort a transaction, discarding its buffered operations
    ///
    /// # Errors
    /// Returns `InvalidTransactionState` if the transaction is not active.
    pub fn abort(&self, txn: &mut TransactionContext, reason: impl Into<String>) -> EngineResult<()> {
        let reason = reason.into();
        let pending = txn.pending_operations();
        txn.mark_aborted(reason.clone())?;
        self.aborted.fetch_add(1, Ordering::Relaxed);
        debug!(
            target: "dbunit::txn",
            txn_id = txn.txn_id,
            discarded = pending.total(),
            reason = %reason,
            "Transaction aborted"
        );
        Ok(())
    }

    /// Commit the changes made since a savepoint, independently of the
    /// enclosing transaction
    ///
    /// The savepoint is released. The enclosing transaction stays active
    /// and keeps every change made before the savepoint.
    ///
    /// # Errors
    /// Returns `InvalidSavepoint` if no savepoint has that name.
    pub fn publish_savepoint(
        &self,
        txn: &mut TransactionContext,
        name: &str,
        store: &dyn Storage,
    ) -> EngineResult<u64> {
        let batch = txn.split_savepoint(name)?;
        let ops = batch.len();
        let version = store.apply(batch);
        self.published.fetch_add(1, Ordering::Relaxed);
        debug!(
            target: "dbunit::txn",
            txn_id = txn.txn_id,
            savepoint = name,
            version,
            ops,
            "Savepoint published"
        );
        Ok(version)
    }

    /// Snapshot of the activity counters
    pub fn metrics(&self) -> TransactionMetrics {
        TransactionMetrics {
            started: self.started.load(Ordering::Relaxed),
            committed: self.committed.load(Ordering::Relaxed),
            aborted: self.aborted.load(Ordering::Relaxed),
            published: self.published.load(Ordering::Relaxed),
        }
    }
}
