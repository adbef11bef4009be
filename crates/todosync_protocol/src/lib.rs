//! # Todosync Protocol
//!
//! Wire types and JSON codecs for todosync.
//!
//! This crate provides:
//! - [`ActionToSync`] and [`ActionKind`] for queued client mutations
//! - [`SyncRequest`] / [`SyncResponse`] for one upload round-trip
//! - JSON encoding/decoding, including the newline-delimited form used
//!   by the socket transport
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod action;
mod codec;
mod error;
mod messages;

pub use action::{ActionKind, ActionToSync};
pub use codec::{
    decode_request, decode_request_line, decode_response, encode_request, encode_response,
    encode_response_line,
};
pub use error::{ProtocolError, ProtocolResult};
pub use messages::{SyncRequest, SyncResponse, TodoView};
