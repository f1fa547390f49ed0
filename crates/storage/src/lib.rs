//! Storage layer for dbunit
//!
//! This crate implements the committed-data backend:
//! - UnifiedStore: BTreeMap-based storage with RwLock
//! - Version management with AtomicU64 (one version per commit)
//!
//! Uncommitted data never reaches this layer; it is buffered in the
//! transaction context until commit or savepoint publication.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod unified;

pub use unified::UnifiedStore;
