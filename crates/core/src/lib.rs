//! Core types and traits for dbunit
//!
//! This crate defines the foundational types used throughout the system:
//! - QualifiedName: schema-qualified routine name
//! - SessionId: identifier of a connected session
//! - Key / Versioned / WriteBatch: row addressing and committed data
//! - Value: unified value enum with three-valued comparisons
//! - EngineError: typed error carrying an ErrorCode and its ErrorKind
//! - HookKind / Conventions: naming conventions for test discovery
//! - Outcome / TestResult: result records produced by a suite run
//! - Traits: Storage abstraction used by the transaction layer

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod conventions;
pub mod error;
pub mod suite_types;
pub mod traits;
pub mod types;
pub mod value;

pub use conventions::{Conventions, HookKind};
pub use error::{EngineError, EngineResult, ErrorCode, ErrorKind};
pub use suite_types::{Outcome, TestResult};
pub use traits::Storage;
pub use types::{Key, QualifiedName, SessionId, Versioned, WriteBatch};
pub use value::Value;
