//! Routine catalog
//!
//! The catalog maps qualified names to routines. Lookups are exact-string
//! comparisons; listing by prefix walks every schema in qualified-name order.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use dbunit_core::QualifiedName;

use crate::routine::{Routine, RoutineHandle};

/// Registry of every routine known to a database
#[derive(Default)]
pub struct Catalog {
    routines: RwLock<BTreeMap<QualifiedName, Arc<dyn Routine>>>,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a routine
    ///
    /// Returns `true` if a routine of that name was replaced.
    pub fn register(&self, name: QualifiedName, routine: Arc<dyn Routine>) -> bool {
        debug!(target: "dbunit::catalog", routine = %name, "Routine registered");
        self.routines.write().insert(name, routine).is_some()
    }

    /// Remove a routine
    ///
    /// Returns `true` if the routine existed.
    pub fn drop_routine(&self, name: &QualifiedName) -> bool {
        let removed = self.routines.write().remove(name).is_some();
        if removed {
            debug!(target: "dbunit::catalog", routine = %name, "Routine dropped");
        }
        removed
    }

    /// Find a routine by exact qualified name
    pub fn lookup(&self, name: &QualifiedName) -> Option<RoutineHandle> {
        self.routines
            .read()
            .get(name)
            .map(|routine| RoutineHandle::new(name.clone(), Arc::clone(routine)))
    }

    /// Check whether a routine exists
    pub fn exists(&self, name: &QualifiedName) -> bool {
        self.routines.read().contains_key(name)
    }

    /// All routines in every schema whose unqualified name starts with
    /// `prefix`, ordered by qualified name
    pub fn list_routines(&self, prefix: &str) -> Vec<RoutineHandle> {
        self.routines
            .read()
            .iter()
            .filter(|(name, _)| name.name.starts_with(prefix))
            .map(|(name, routine)| RoutineHandle::new(name.clone(), Arc::clone(routine)))
            .collect()
    }

    /// Number of registered routines
    pub fn len(&self) -> usize {
        self.routines.read().len()
    }

    /// Check if no routines are registered
    pub fn is_empty(&self) -> bool {
        self.routines.read().is_empty()
    }
}
