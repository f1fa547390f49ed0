//! Database struct and open logic
//!
//! A Database is a named, in-process instance holding:
//! - Committed storage
//! - The routine catalog
//! - The transaction manager
//! - The table of connected sessions
//! - Configuration (mirrors `dbunit.toml`)
//!
//! Databases are shared as `Arc<Database>`. Opening the same name twice
//! returns the same instance while any handle to it is alive.

pub mod config;
mod registry;

pub use config::{DbunitConfig, CONFIG_FILE_NAME};
pub use registry::{lookup, open_database_names, OPEN_DATABASES};

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, info};

use dbunit_concurrency::{TransactionManager, TransactionMetrics};
use dbunit_core::{EngineError, EngineResult, QualifiedName, SessionId, Value};
use dbunit_storage::UnifiedStore;

use crate::admin::SessionInfo;
use crate::catalog::Catalog;
use crate::routine::Routine;
use crate::session::{Session, SessionState};

/// Counter used to name ephemeral databases
static EPHEMERAL_SEQ: AtomicU64 = AtomicU64::new(1);

/// Main database struct
///
/// # Example
///
/// ```text
/// use dbunit_engine::Database;
///
/// let db = Database::open("inventory")?;
/// db.register_routine("test_case_stock_level", |s: &mut Session| {
///     s.put("stock", "widget", 3)?;
///     Ok(Value::Null)
/// })?;
/// let mut session = db.connect();
/// session.call("test_case_stock_level")?;
/// ```
pub struct Database {
    /// Registry name
    name: String,
    /// Committed rows
    pub(crate) store: UnifiedStore,
    /// Routine catalog
    catalog: Catalog,
    /// Transaction id allocation, commit and savepoint publication
    pub(crate) manager: TransactionManager,
    /// Connected sessions
    pub(crate) sessions: DashMap<SessionId, Arc<SessionState>>,
    /// Next session id
    next_session_id: AtomicU64,
    /// Unified configuration (mirrors dbunit.toml)
    config: RwLock<DbunitConfig>,
}

impl Database {
    /// Open (or reuse) the database with the given name
    ///
    /// # Thread Safety
    ///
    /// Opening the same name from multiple threads returns the same
    /// `Arc<Database>`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for an empty name.
    pub fn open(name: &str) -> EngineResult<Arc<Database>> {
        Self::open_inner(name, None)
    }

    /// Open the database with an explicit configuration
    ///
    /// If the database is already open its configuration is replaced.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for an empty name or an invalid config.
    pub fn open_with_config(name: &str, config: DbunitConfig) -> EngineResult<Arc<Database>> {
        config.validate()?;
        Self::open_inner(name, Some(config))
    }

    /// Open the database configured by a `dbunit.toml` file
    ///
    /// A default file is written if none exists at `path`.
    pub fn open_with_config_file(name: &str, path: &Path) -> EngineResult<Arc<Database>> {
        DbunitConfig::write_default_if_missing(path)?;
        let config = DbunitConfig::from_file(path)?;
        Self::open_with_config(name, config)
    }

    /// Create a fresh, uniquely named database
    ///
    /// Ephemeral databases are registered like any other, so administration
    /// functions can find them by [`Database::name`].
    pub fn ephemeral() -> EngineResult<Arc<Database>> {
        let seq = EPHEMERAL_SEQ.fetch_add(1, Ordering::Relaxed);
        Self::open(&format!("ephemeral-{}", seq))
    }

    fn open_inner(name: &str, config: Option<DbunitConfig>) -> EngineResult<Arc<Database>> {
        if name.is_empty() {
            return Err(EngineError::invalid_parameter("database name must not be empty"));
        }

        let mut registry = OPEN_DATABASES.lock();
        if let Some(db) = registry.get(name).and_then(|weak| weak.upgrade()) {
            if let Some(config) = config {
                *db.config.write() = config;
            }
            debug!(target: "dbunit::db", name, "Reusing open database");
            return Ok(db);
        }

        let db = Arc::new(Database {
            name: name.to_string(),
            store: UnifiedStore::new(),
            catalog: Catalog::new(),
            manager: TransactionManager::new(),
            sessions: DashMap::new(),
            next_session_id: AtomicU64::new(1),
            config: RwLock::new(config.unwrap_or_default()),
        });
        registry.insert(name.to_string(), Arc::downgrade(&db));
        info!(target: "dbunit::db", name, "Database opened");
        Ok(db)
    }

    /// Registry name of this database
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Connect a new session
    pub fn connect(self: &Arc<Self>) -> Session {
        let id = SessionId::new(self.next_session_id.fetch_add(1, Ordering::SeqCst));
        let state = Arc::new(SessionState::new(id));
        self.sessions.insert(id, Arc::clone(&state));
        debug!(target: "dbunit::db", database = %self.name, session = %id, "Session connected");
        Session::new(Arc::clone(self), state)
    }

    /// Connected sessions, ordered by id
    pub fn active_sessions(&self) -> Vec<SessionInfo> {
        let mut sessions: Vec<SessionInfo> = self
            .sessions
            .iter()
            .map(|entry| entry.value().info())
            .collect();
        sessions.sort_by_key(|info| info.session_id);
        sessions
    }

    // ========================================================================
    // Catalog
    // ========================================================================

    /// Routine catalog
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Create or replace a routine
    ///
    /// An unqualified name is placed in the configured default schema.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for an empty name.
    pub fn register_routine<F>(&self, name: &str, routine: F) -> EngineResult<QualifiedName>
    where
        F: Fn(&mut Session) -> EngineResult<Value> + Send + Sync + 'static,
    {
        self.register_shared_routine(name, Arc::new(routine))
    }

    /// Create or replace a routine from any [`Routine`] implementation
    pub fn register_shared_routine(
        &self,
        name: &str,
        routine: Arc<dyn Routine>,
    ) -> EngineResult<QualifiedName> {
        let qualified = self.qualify(name)?;
        self.catalog.register(qualified.clone(), routine);
        Ok(qualified)
    }

    /// Remove a routine
    ///
    /// # Errors
    ///
    /// Returns `UndefinedFunction` if no routine has that name.
    pub fn drop_routine(&self, name: &str) -> EngineResult<()> {
        let qualified = self.qualify(name)?;
        if self.catalog.drop_routine(&qualified) {
            Ok(())
        } else {
            Err(EngineError::undefined_routine(&qualified))
        }
    }

    /// Qualify a routine name with the default schema
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the routine name is empty.
    pub fn qualify(&self, name: &str) -> EngineResult<QualifiedName> {
        let qualified = QualifiedName::parse(name, &self.config.read().default_schema);
        if qualified.name.is_empty() {
            return Err(EngineError::invalid_parameter("routine name must not be empty"));
        }
        Ok(qualified)
    }

    // ========================================================================
    // Configuration and metrics
    // ========================================================================

    /// Current configuration
    pub fn config(&self) -> DbunitConfig {
        self.config.read().clone()
    }

    /// Replace the configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the config does not validate; the
    /// current configuration is kept.
    pub fn set_config(&self, config: DbunitConfig) -> EngineResult<()> {
        config.validate()?;
        *self.config.write() = config;
        Ok(())
    }

    /// Transaction activity counters
    pub fn metrics(&self) -> TransactionMetrics {
        self.manager.metrics()
    }

    /// Number of committed rows across all tables
    pub fn row_count(&self) -> usize {
        self.store.len()
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        let mut registry = OPEN_DATABASES.lock();
        let stale = registry
            .get(&self.name)
            .map(|weak| weak.strong_count() == 0)
            .unwrap_or(false);
        if stale {
            registry.remove(&self.name);
        }
        debug!(target: "dbunit::db", name = %self.name, "Database closed");
    }
}
