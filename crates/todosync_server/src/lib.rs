//! # Todosync Server
//!
//! Offline-sync backend for a single shared todo list.
//!
//! This crate provides:
//! - [`Reconciler`]: applies uploaded action batches exactly once
//! - [`ResponseAssembler`]: builds the reply (device id, outputs, todos)
//! - HTTP transport (`POST /`) and a newline-delimited JSON transport for
//!   Unix sockets
//!
//! # Protocol
//!
//! Each device queues mutations locally and periodically uploads every
//! action it has no output for yet:
//! 1. The server finds or creates the device by uid
//! 2. Actions already recorded for the device are replayed, not re-run
//! 3. New actions are executed in order; temporary ids bound by adds earlier
//!    in the batch resolve to the real ids the server assigned
//! 4. The reply carries every recorded output and the full todo list
//!
//! Retransmitting a batch after a lost reply therefore has no further
//! effect on the todo list and yields the same outputs.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod error;
pub mod http;
mod lines;
mod reconciler;
mod response;
mod server;
#[cfg(unix)]
mod socket;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use lines::serve_lines;
pub use reconciler::Reconciler;
pub use response::ResponseAssembler;
pub use server::SyncServer;
#[cfg(unix)]
pub use socket::serve_socket;
