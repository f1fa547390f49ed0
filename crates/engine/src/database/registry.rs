//! Global database registry
//!
//! Maps database names to live instances so that opening the same name twice
//! returns the same Database, and so that administration functions can find
//! a database by name. Uses weak references so a database is freed once its
//! last handle and session are dropped.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use super::Database;

/// Global registry of open databases (name -> weak reference)
pub static OPEN_DATABASES: Lazy<Mutex<HashMap<String, Weak<Database>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Find a live database by name
pub fn lookup(name: &str) -> Option<Arc<Database>> {
    OPEN_DATABASES.lock().get(name).and_then(Weak::upgrade)
}

/// Names of every live database, sorted
pub fn open_database_names() -> Vec<String> {
    let registry = OPEN_DATABASES.lock();
    let mut names: Vec<String> = registry
        .iter()
        .filter(|(_, weak)| weak.strong_count() > 0)
        .map(|(name, _)| name.clone())
        .collect();
    names.sort();
    names
}
