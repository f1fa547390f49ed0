//! Naming conventions for test discovery
//!
//! A test unit is a routine whose name starts with the test-case marker,
//! e.g. `test_case_company_finance_invoice`. Lifecycle hooks are routines
//! whose names start with a hook marker followed by a prefix of the unit's
//! subject path, e.g. `test_setup_company_finance`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{EngineError, EngineResult};

/// Lifecycle hook category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookKind {
    /// Runs before the measured phase, outside timing
    Setup,
    /// Boolean check run before the unit body
    Precondition,
    /// Boolean check run after the unit body
    Postcondition,
    /// Runs after the result has been emitted
    Teardown,
}

impl HookKind {
    /// Lowercase name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            HookKind::Setup => "setup",
            HookKind::Precondition => "precondition",
            HookKind::Postcondition => "postcondition",
            HookKind::Teardown => "teardown",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Textual markers used to match routine names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conventions {
    /// Token delimiter inside routine names
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    /// Marker of test units
    #[serde(default = "default_test_case")]
    pub test_case: String,
    /// Marker of setup hooks
    #[serde(default = "default_setup")]
    pub setup: String,
    /// Marker of precondition hooks
    #[serde(default = "default_precondition")]
    pub precondition: String,
    /// Marker of postcondition hooks
    #[serde(default = "default_postcondition")]
    pub postcondition: String,
    /// Marker of teardown hooks
    #[serde(default = "default_teardown")]
    pub teardown: String,
}

fn default_delimiter() -> String {
    "_".to_string()
}

fn default_test_case() -> String {
    "test_case".to_string()
}

fn default_setup() -> String {
    "test_setup".to_string()
}

fn default_precondition() -> String {
    "test_precondition".to_string()
}

fn default_postcondition() -> String {
    "test_postcondition".to_string()
}

fn default_teardown() -> String {
    "test_teardown".to_string()
}

impl Default for Conventions {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            test_case: default_test_case(),
            setup: default_setup(),
            precondition: default_precondition(),
            postcondition: default_postcondition(),
            teardown: default_teardown(),
        }
    }
}

impl Conventions {
    /// Marker for a hook kind
    pub fn marker(&self, kind: HookKind) -> &str {
        match kind {
            HookKind::Setup => &self.setup,
            HookKind::Precondition => &self.precondition,
            HookKind::Postcondition => &self.postcondition,
            HookKind::Teardown => &self.teardown,
        }
    }

    /// Number of delimiter-separated tokens in a marker
    ///
    /// `test_case` is two tokens, so a unit named `test_case_a_b` has the
    /// subject path `a`, `b`.
    pub fn prefix_token_count(&self, marker: &str) -> usize {
        marker.split(self.delimiter.as_str()).count()
    }

    /// Name prefix shared by every test unit (`test_case_`)
    pub fn unit_prefix(&self) -> String {
        format!("{}{}", self.test_case, self.delimiter)
    }

    /// Validate the conventions
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the delimiter or any marker is empty,
    /// or if two markers are identical.
    pub fn validate(&self) -> EngineResult<()> {
        if self.delimiter.is_empty() {
            return Err(EngineError::invalid_parameter(
                "conventions.delimiter must not be empty",
            ));
        }
        let markers = [
            ("test_case", &self.test_case),
            ("setup", &self.setup),
            ("precondition", &self.precondition),
            ("postcondition", &self.postcondition),
            ("teardown", &self.teardown),
        ];
        for (field, marker) in &markers {
            if marker.is_empty() {
                return Err(EngineError::invalid_parameter(format!(
                    "conventions.{} must not be empty",
                    field
                )));
            }
        }
        for (i, (field_a, a)) in markers.iter().enumerate() {
            for (field_b, b) in &markers[i + 1..] {
                if a == b {
                    return Err(EngineError::invalid_parameter(format!(
                        "conventions.{} and conventions.{} are both '{}'",
                        field_a, field_b, a
                    )));
                }
            }
        }
        Ok(())
    }
}
