//! Database engine for dbunit
//!
//! This crate hosts the routines that test suites are made of:
//! - Database: named instance with storage, catalog and configuration
//! - Session: one top-level transaction, autocommit, savepoints,
//!   routine invocation and data operations
//! - Catalog / Routine: the registry of callable routines
//! - Admin: session listing and termination
//!
//! The engine is the only component that knows about sessions and the
//! coordination between the catalog, transactions and storage.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod admin;
pub mod catalog;
pub mod database;
pub mod routine;
pub mod session;

pub use admin::{terminate_sessions, SessionInfo, TerminatedSession};
pub use catalog::Catalog;
pub use database::{Database, DbunitConfig, CONFIG_FILE_NAME};
pub use routine::{Routine, RoutineHandle};
pub use session::Session;
