//! UnifiedStore: committed row storage with BTreeMap and version management
//!
//! This module implements the Storage trait using:
//! - `BTreeMap<Key, Versioned>` for ordered row storage
//! - `parking_lot::RwLock` for thread-safe access
//! - `AtomicU64` for monotonically increasing commit versions
//!
//! # Design Notes
//!
//! - **No version history**: each row stores only its latest value
//! - **One version per batch**: every row written by a batch carries the
//!   same commit version
//! - **Version allocated under the write lock**: commit versions and the
//!   order in which batches become visible always agree

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::trace;

use dbunit_core::{Key, Storage, Versioned, WriteBatch};

/// Unified storage backend using BTreeMap with RwLock
#[derive(Debug, Default)]
pub struct UnifiedStore {
    /// The main data store: ordered map from Key to its committed value
    data: RwLock<BTreeMap<Key, Versioned>>,
    /// Global version counter for monotonically increasing versions
    version: AtomicU64,
}

impl UnifiedStore {
    /// Create a new empty UnifiedStore
    ///
    /// Initial version is 0 (no commits have occurred).
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed rows across all tables
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Check if no rows are stored
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Names of all tables holding at least one row, sorted
    pub fn table_names(&self) -> Vec<String> {
        let data = self.data.read();
        let mut names: Vec<String> = Vec::new();
        for key in data.keys() {
            if names.last().map(String::as_str) != Some(key.table.as_str()) {
                names.push(key.table.clone());
            }
        }
        names
    }
}

impl Storage for UnifiedStore {
    fn get(&self, key: &Key) -> Option<Versioned> {
        self.data.read().get(key).cloned()
    }

    fn scan_table(&self, table: &str) -> Vec<(Key, Versioned)> {
        let data = self.data.read();
        let start = Key::new(table, "");
        data.range(start..)
            .take_while(|(k, _)| k.in_table(table))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn apply(&self, batch: WriteBatch) -> u64 {
        if batch.is_empty() {
            return self.current_version();
        }

        let mut data = self.data.write();
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        let ops = batch.len();

        for key in batch.deletes {
            data.remove(&key);
        }
        for (key, value) in batch.puts {
            data.insert(key, Versioned::new(value, version));
        }

        trace!(target: "dbunit::storage", version, ops, "Batch applied");
        version
    }

    fn current_version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }
}
