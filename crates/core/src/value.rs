//! Value types for dbunit
//!
//! This module defines:
//! - Value: unified enum for all data stored in tables and returned by routines
//!
//! ## Comparison Model
//!
//! `PartialEq` is structural: `Null == Null`, different types are never equal.
//! The SQL-style comparisons [`Value::sql_eq`] and [`Value::sql_ne`] follow
//! three-valued logic instead:
//!
//! - a `Null` operand makes the result unknown (`Ok(None)`)
//! - `Int` and `Float` compare numerically
//! - any other mix of types is a datatype mismatch

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{EngineError, EngineResult};

/// Value stored in tables and returned by routines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point (IEEE-754)
    Float(f64),
    /// UTF-8 string
    String(String),
}

// Custom PartialEq implementation for IEEE-754 float semantics
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "bigint",
            Value::Float(_) => "double precision",
            Value::String(_) => "text",
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// SQL equality under three-valued logic
    ///
    /// # Errors
    ///
    /// Returns `DatatypeMismatch` when the operand types cannot be compared.
    pub fn sql_eq(&self, other: &Value) -> EngineResult<Option<bool>> {
        let result = match (self, other) {
            (Value::Null, _) | (_, Value::Null) => None,
            (Value::Bool(a), Value::Bool(b)) => Some(a == b),
            (Value::Int(a), Value::Int(b)) => Some(a == b),
            (Value::Float(a), Value::Float(b)) => Some(a == b),
            (Value::Int(a), Value::Float(b)) => Some((*a as f64) == *b),
            (Value::Float(a), Value::Int(b)) => Some(*a == (*b as f64)),
            (Value::String(a), Value::String(b)) => Some(a == b),
            (a, b) => {
                return Err(EngineError::datatype_mismatch(format!(
                    "operator does not exist: {} = {}",
                    a.type_name(),
                    b.type_name()
                ))
                .with_hint("Compare values of the same type."))
            }
        };
        Ok(result)
    }

    /// SQL inequality under three-valued logic
    ///
    /// # Errors
    ///
    /// Returns `DatatypeMismatch` when the operand types cannot be compared.
    pub fn sql_ne(&self, other: &Value) -> EngineResult<Option<bool>> {
        Ok(self.sql_eq(other)?.map(|eq| !eq))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(b) => f.write_str(if *b { "true" } else { "false" }),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

// ============================================================================
// From implementations for ergonomic API usage
// ============================================================================

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}
