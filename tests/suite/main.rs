//! Suite Execution Tests
//!
//! End-to-end tests for the orchestration layer:
//! - Hook resolution by hierarchical name fallback
//! - Isolation boundaries and their independence from the caller
//! - Outcome classification (SUCCESS / FAILED / ERRONEOUS)
//! - Lifecycle ordering, setup/teardown failures, early abandonment
//! - Reporting

#[path = "../common/mod.rs"]
mod common;

mod classification;
mod isolation;
mod lifecycle;
mod reporting;
mod resolution;
