//! Store fixtures.
//!
//! Provides stores with automatic cleanup and a helper to run the same
//! check against every store implementation.

use std::sync::Arc;
use tempfile::TempDir;
use todosync_server::{Reconciler, ServerConfig};
use todosync_store::{EntityStore, MemoryStore, SqliteStore};

/// A store under test, with its backing directory kept alive.
pub struct StoreFixture {
    /// Human-readable name for assertion messages.
    pub name: &'static str,
    store: Arc<dyn EntityStore>,
    _temp_dir: Option<TempDir>,
}

impl StoreFixture {
    /// Creates an in-memory store.
    pub fn memory() -> Self {
        Self {
            name: "memory",
            store: Arc::new(MemoryStore::new()),
            _temp_dir: None,
        }
    }

    /// Creates a SQLite store in a fresh temporary directory.
    pub fn sqlite() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = SqliteStore::open(&temp_dir.path().join("todos.db"))
            .expect("Failed to open sqlite store");
        Self {
            name: "sqlite",
            store: Arc::new(store),
            _temp_dir: Some(temp_dir),
        }
    }

    /// Returns the store.
    pub fn store(&self) -> Arc<dyn EntityStore> {
        Arc::clone(&self.store)
    }

    /// Returns a reconciler over the store with default configuration.
    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(self.store(), ServerConfig::default())
    }
}

/// Runs `check` once against each store implementation.
///
/// # Example
///
/// ```rust
/// use todosync_store::EntityStore;
/// use todosync_testkit::for_each_store;
///
/// for_each_store(|fixture| {
///     let todos = fixture.store().list_todos().unwrap();
///     assert!(todos.is_empty(), "{}", fixture.name);
/// });
/// ```
pub fn for_each_store(check: impl Fn(&StoreFixture)) {
    check(&StoreFixture::memory());
    check(&StoreFixture::sqlite());
}
