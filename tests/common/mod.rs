//! Shared test utilities for the integration suites.
//!
//! Import from a test's main.rs with `#[path = "../common/mod.rs"] mod common;`.

#![allow(dead_code)]

use std::sync::{Arc, Once};

use dbunit::{Database, EngineResult, Session, Value};
use parking_lot::Mutex;

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Install a test-friendly tracing subscriber once per process.
///
/// Honors `RUST_LOG`; silent (`warn`) otherwise.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Fresh, uniquely named database with tracing initialized.
pub fn fresh_db() -> Arc<Database> {
    init_tracing();
    Database::ephemeral().unwrap()
}

// ============================================================================
// Journal - records the order in which routines ran
// ============================================================================

/// Append-only event log shared between routines and assertions.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn contains(&self, event: &str) -> bool {
        self.0.lock().iter().any(|e| e == event)
    }
}

/// Register a routine that only records its own name and returns `result`.
pub fn register_recorder(db: &Database, journal: &Journal, name: &str, result: Value) {
    let journal = journal.clone();
    let event = name.to_string();
    db.register_routine(name, move |_: &mut Session| -> EngineResult<Value> {
        journal.push(event.clone());
        Ok(result.clone())
    })
    .unwrap();
}

/// Register a routine that does nothing.
pub fn register_noop(db: &Database, name: &str) {
    db.register_routine(name, |_: &mut Session| Ok(Value::Null))
        .unwrap();
}
