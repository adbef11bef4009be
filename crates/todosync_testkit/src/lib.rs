//! # Todosync Testkit
//!
//! Test utilities for todosync.
//!
//! This crate provides:
//! - Store fixtures (in-memory, SQLite in a temp directory)
//! - Property-based batch generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use todosync_testkit::prelude::*;
//!
//! #[test]
//! fn replays_are_idempotent() {
//!     for_each_store(|fixture| {
//!         let reconciler = fixture.reconciler();
//!         // ... process batches
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
