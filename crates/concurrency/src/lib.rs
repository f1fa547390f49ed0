//! Concurrency layer for dbunit
//!
//! This crate implements the session-level transaction model:
//! - TransactionContext: buffered writes with read-your-writes semantics
//! - Savepoints: rollback to, release, and split off as a publishable batch
//! - TransactionManager: id allocation, commit, abort, savepoint publication
//!
//! There is no conflict validation: commits are applied in the order they
//! reach storage (last writer wins).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod manager;
pub mod transaction;

pub use manager::{TransactionManager, TransactionMetrics};
pub use transaction::{PendingOperations, TransactionContext, TransactionStatus};
