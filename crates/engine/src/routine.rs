//! Routines: the callable units stored in the catalog
//!
//! A routine takes no arguments, runs inside the calling session's current
//! transaction, and returns a [`Value`]. Boolean hooks return `Value::Bool`.

use std::fmt;
use std::sync::Arc;

use dbunit_core::{EngineResult, QualifiedName, Value};

use crate::session::Session;

/// A zero-argument routine executed against a session
pub trait Routine: Send + Sync {
    /// Run the routine
    fn call(&self, session: &mut Session) -> EngineResult<Value>;
}

impl<F> Routine for F
where
    F: Fn(&mut Session) -> EngineResult<Value> + Send + Sync,
{
    fn call(&self, session: &mut Session) -> EngineResult<Value> {
        self(session)
    }
}

/// A routine bound to the name it was found under
///
/// Handles are resolved once and invoked later; dropping the routine from
/// the catalog afterwards does not invalidate a handle already held.
#[derive(Clone)]
pub struct RoutineHandle {
    name: QualifiedName,
    routine: Arc<dyn Routine>,
}

impl RoutineHandle {
    /// Bind a routine to its name
    pub fn new(name: QualifiedName, routine: Arc<dyn Routine>) -> Self {
        Self { name, routine }
    }

    /// Qualified name of the routine
    pub fn name(&self) -> &QualifiedName {
        &self.name
    }

    pub(crate) fn routine(&self) -> &Arc<dyn Routine> {
        &self.routine
    }
}

impl fmt::Debug for RoutineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutineHandle")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for RoutineHandle {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Arc::ptr_eq(&self.routine, &other.routine)
    }
}
