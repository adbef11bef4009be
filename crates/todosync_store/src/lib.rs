//! # Todosync Store
//!
//! Entity store for todosync.
//!
//! The store owns all persistent state: devices (with the outputs of every
//! action they have had executed) and todos. The reconciler consults it only
//! through the narrow [`EntityStore`] contract.
//!
//! ## Available Stores
//!
//! - [`MemoryStore`] - For testing and ephemeral servers
//! - [`SqliteStore`] - Durable storage in a single SQLite file
//!
//! ## Example
//!
//! ```rust
//! use todosync_store::{EntityStore, MemoryStore, TodoPatch};
//!
//! let store = MemoryStore::new();
//! let todo = store.create_todo("buy milk", false).unwrap();
//! let patch = TodoPatch { completed: Some(true), ..TodoPatch::default() };
//! assert_eq!(store.update_todo(todo.id, &patch).unwrap(), 1);
//! assert!(store.list_todos().unwrap()[0].completed);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod error;
mod memory;
mod model;
mod sqlite;
mod store;

pub use config::DatabaseConfig;
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use model::{ActionOutputs, Device, Todo, TodoMutation, TodoPatch};
pub use sqlite::SqliteStore;
pub use store::EntityStore;
