//! Error types for the sync server.

use thiserror::Error;
use todosync_protocol::ProtocolError;
use todosync_store::StoreError;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the sync server.
///
/// Any reconciliation error aborts the rest of the batch. Actions applied
/// before the failing one stay applied.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Invalid request, such as a blank device uid.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// An action references a temporary id that no earlier add bound.
    #[error("action {action_id}: unknown todo for temporary id {temp_id}")]
    UnresolvedTempId {
        /// Offending action.
        action_id: i64,
        /// The unbound temporary id.
        temp_id: i64,
    },

    /// An action has an invalid todo reference or is missing a field.
    #[error("action {action_id}: {reason}")]
    InvalidAction {
        /// Offending action.
        action_id: i64,
        /// What is wrong with it.
        reason: String,
    },

    /// An action type is not recognized.
    #[error("action {action_id}: unknown action type {kind:?}")]
    UnknownActionType {
        /// Offending action.
        action_id: i64,
        /// The unrecognized type name.
        kind: String,
    },

    /// The entity store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A message could not be decoded or encoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// I/O error on a listener or connection.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub(crate) fn invalid_action(action_id: i64, reason: impl Into<String>) -> Self {
        Self::InvalidAction {
            action_id,
            reason: reason.into(),
        }
    }

    /// Returns true if the request itself is at fault (4xx).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServerError::InvalidRequest(_)
                | ServerError::UnresolvedTempId { .. }
                | ServerError::InvalidAction { .. }
                | ServerError::UnknownActionType { .. }
                | ServerError::Protocol(_)
        )
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            ServerError::Store(_) | ServerError::Io(_) | ServerError::Internal(_)
        )
    }
}
