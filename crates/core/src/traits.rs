//! Core traits for storage abstraction
//!
//! The transaction layer only talks to committed data through [`Storage`],
//! so the in-memory store can be swapped without touching upper layers.

use crate::types::{Key, Versioned, WriteBatch};

/// Storage abstraction for committed data
///
/// Thread safety: all methods must be safe to call concurrently from
/// multiple threads (requires Send + Sync).
pub trait Storage: Send + Sync {
    /// Get the latest committed value for a key
    fn get(&self, key: &Key) -> Option<Versioned>;

    /// All committed rows of a table, in row order
    fn scan_table(&self, table: &str) -> Vec<(Key, Versioned)>;

    /// Apply a batch atomically and return its commit version
    ///
    /// An empty batch does not allocate a version and returns the current one.
    fn apply(&self, batch: WriteBatch) -> u64;

    /// Version of the most recent commit
    fn current_version(&self) -> u64;
}
