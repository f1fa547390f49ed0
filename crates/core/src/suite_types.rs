//! Result records produced by a suite run

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::types::QualifiedName;

/// Classification of a unit's measured phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Measured phase raised nothing
    Success,
    /// Measured phase raised the failure signal
    Failed,
    /// Measured phase raised any other error
    Erroneous,
}

impl Outcome {
    /// Uppercase label used in reports
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Success => "SUCCESS",
            Outcome::Failed => "FAILED",
            Outcome::Erroneous => "ERRONEOUS",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One record per executed unit
///
/// Records are produced once, in discovery order, and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Qualified name of the unit
    pub name: QualifiedName,
    /// Classification of the measured phase
    pub outcome: Outcome,
    /// `OK` on success, otherwise the captured diagnostic
    pub message: String,
    /// Elapsed time of the measured phase
    pub duration: Duration,
}

impl TestResult {
    /// Check if the unit succeeded
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({:.3}ms): {}",
            self.name,
            self.outcome,
            self.duration.as_secs_f64() * 1000.0,
            self.message
        )
    }
}
