//! Core types for dbunit
//!
//! This module defines the foundational types:
//! - QualifiedName: schema + routine name, ordered lexicographically
//! - SessionId: sequential identifier of a connected session
//! - Key: composite row address (table + row)
//! - Versioned: committed value with its commit version
//! - WriteBatch: ordered puts and deletes applied atomically to storage

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::value::Value;

/// Schema-qualified routine name
///
/// Ordering is by schema, then name, which is the lexicographic order of the
/// rendered `schema.name` form for identifiers without dots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QualifiedName {
    /// Schema (namespace) the routine lives in
    pub schema: String,
    /// Unqualified routine name
    pub name: String,
}

impl QualifiedName {
    /// Create a qualified name from its parts
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Parse `schema.name`, or `name` qualified with `default_schema`
    ///
    /// Only the first `.` separates schema from name.
    pub fn parse(input: &str, default_schema: &str) -> Self {
        match input.split_once('.') {
            Some((schema, name)) if !schema.is_empty() => Self::new(schema, name),
            Some((_, name)) => Self::new(default_schema, name),
            None => Self::new(default_schema, input),
        }
    }

    /// Same schema, different name
    pub fn sibling(&self, name: impl Into<String>) -> Self {
        Self::new(self.schema.clone(), name)
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// Identifier of a connected session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(u64);

impl SessionId {
    /// Create a session ID from a raw value
    pub fn new(id: u64) -> Self {
        SessionId(id)
    }

    /// Get the raw ID value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session:{}", self.0)
    }
}

/// Row address: table name + row key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Key {
    /// Table name
    pub table: String,
    /// Row key within the table
    pub row: String,
}

impl Key {
    /// Create a key
    pub fn new(table: impl Into<String>, row: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            row: row.into(),
        }
    }

    /// Check if this key belongs to `table`
    pub fn in_table(&self, table: &str) -> bool {
        self.table == table
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.table, self.row)
    }
}

/// Committed value with the version of the commit that wrote it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Versioned {
    /// The stored value
    pub value: Value,
    /// Commit version that produced it
    pub version: u64,
}

impl Versioned {
    /// Create a versioned value
    pub fn new(value: Value, version: u64) -> Self {
        Self { value, version }
    }
}

/// Ordered set of writes applied to storage as one commit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    /// Rows to insert or overwrite
    pub puts: Vec<(Key, Value)>,
    /// Rows to remove
    pub deletes: Vec<Key>,
}

impl WriteBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of operations in the batch
    pub fn len(&self) -> usize {
        self.puts.len() + self.deletes.len()
    }

    /// Check if the batch holds no operations
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
