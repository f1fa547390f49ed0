//! dbunit - convention-driven test orchestration for database routines
//!
//! Test units, their setup/teardown hooks and their pre/postconditions are
//! plain routines registered in a database catalog. Naming conventions tie
//! them together:
//!
//! ```text
//! test_case_billing_invoice_totals   unit
//! test_setup_billing                 setup shared by every billing unit
//! test_precondition_billing_invoice  precondition for invoice units
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use dbunit::{assertions::assert_true, run_all, Database, Session, Value};
//!
//! let db = Database::ephemeral()?;
//! db.register_routine("test_case_billing_invoice_totals", |s: &mut Session| {
//!     assert_true(s.count("invoices")? == 0)?;
//!     Ok(Value::Null)
//! })?;
//!
//! let mut session = db.connect();
//! for result in run_all(&mut session) {
//!     println!("{}", result?);
//! }
//! ```
//!
//! # Architecture
//!
//! The orchestration API lives in `dbunit-executor` and is re-exported here;
//! storage, transactions and sessions are provided by the lower crates.

// Re-export the public API from dbunit-executor
pub use dbunit_executor::*;
