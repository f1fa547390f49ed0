//! Database configuration via `dbunit.toml`
//!
//! A database is configured with a small TOML file. `write_default_if_missing`
//! creates a commented default on first use; edit the file and reopen the
//! database to change settings.

use serde::{Deserialize, Serialize};
use std::path::Path;

use dbunit_core::{Conventions, EngineError, EngineResult};

/// Config file name used by [`crate::Database::open_with_config_file`] callers.
pub const CONFIG_FILE_NAME: &str = "dbunit.toml";

/// Database configuration loaded from `dbunit.toml`.
///
/// # Example
///
/// ```toml
/// default_schema = "public"
/// max_call_depth = 64
///
/// [conventions]
/// delimiter = "_"
/// test_case = "test_case"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbunitConfig {
    /// Schema used for unqualified routine names.
    #[serde(default = "default_schema")]
    pub default_schema: String,
    /// Maximum nesting of routine calls within one session.
    #[serde(default = "default_max_call_depth")]
    pub max_call_depth: usize,
    /// Naming conventions used for test discovery.
    #[serde(default)]
    pub conventions: Conventions,
}

fn default_schema() -> String {
    "public".to_string()
}

fn default_max_call_depth() -> usize {
    64
}

impl Default for DbunitConfig {
    fn default() -> Self {
        Self {
            default_schema: default_schema(),
            max_call_depth: default_max_call_depth(),
            conventions: Conventions::default(),
        }
    }
}

impl DbunitConfig {
    /// Check every setting.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for an empty default schema, a zero call
    /// depth, or invalid naming conventions.
    pub fn validate(&self) -> EngineResult<()> {
        if self.default_schema.is_empty() {
            return Err(EngineError::invalid_parameter(
                "default_schema must not be empty",
            ));
        }
        if self.max_call_depth == 0 {
            return Err(EngineError::invalid_parameter(
                "max_call_depth must be greater than zero",
            ));
        }
        self.conventions.validate()
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# dbunit database configuration
#
# Schema used when a routine name is not schema-qualified.
default_schema = "public"

# Maximum nesting of routine calls within one session.
max_call_depth = 64

# Naming conventions for test discovery. A unit named
# test_case_billing_invoice picks up test_setup_billing_invoice, or
# test_setup_billing when the more specific hook does not exist.
[conventions]
delimiter = "_"
test_case = "test_case"
setup = "test_setup"
precondition = "test_precondition"
postcondition = "test_postcondition"
teardown = "test_teardown"
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: &Path) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EngineError::internal(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: DbunitConfig = toml::from_str(&content).map_err(|e| {
            EngineError::invalid_parameter(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> EngineResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                EngineError::internal(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> EngineResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| EngineError::internal(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            EngineError::internal(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
