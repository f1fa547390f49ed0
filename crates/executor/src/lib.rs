//! # dbunit Executor
//!
//! Convention-driven orchestration of test routines stored in a dbunit
//! database.
//!
//! - [`run_all`] / [`run_suite`]: discover units and run their lifecycle
//! - [`resolve_hook`]: hierarchical lookup of setup, precondition,
//!   postcondition and teardown hooks
//! - [`run_isolated`]: execute work in an independently committed boundary
//! - [`check`]: turn a `false` boolean hook into the failure signal
//! - [`assertions`]: helpers raising the failure signal
//! - [`TestReporter`]: consume a run's records
//!
//! ## Quick Start
//!
//! ```text
//! use dbunit_executor::{assertions::assert_equals, run_all, Database, Session, Value};
//!
//! let db = Database::open("inventory")?;
//! db.register_routine("test_setup_stock", |s: &mut Session| {
//!     s.put("stock", "widget", 3)?;
//!     Ok(Value::Null)
//! })?;
//! db.register_routine("test_case_stock_level", |s: &mut Session| {
//!     assert_equals(3, s.get("stock", "widget")?)?;
//!     Ok(Value::Null)
//! })?;
//!
//! let mut session = db.connect();
//! for result in run_all(&mut session) {
//!     println!("{}", result?);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assertions;
mod condition;
mod isolation;
mod reporter;
mod resolver;
mod suite;

pub use condition::{check, check_optional};
pub use isolation::{run_isolated, FailureEnvelope, Statement, Step};
pub use reporter::{JsonLinesReporter, LogReporter, SuiteSummary, TestReporter};
pub use resolver::{resolve, resolve_hook};
pub use suite::{run, run_all, run_suite, SuiteRun};

// Host types users need alongside the orchestration API
pub use dbunit_core::{
    Conventions, EngineError, EngineResult, ErrorCode, ErrorKind, HookKind, Outcome,
    QualifiedName, TestResult, Value,
};
pub use dbunit_engine::{
    terminate_sessions, Catalog, Database, DbunitConfig, Routine, RoutineHandle, Session,
    SessionInfo, TerminatedSession,
};
