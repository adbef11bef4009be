//! Server configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Request body bytes allowed per action when no explicit limit is set.
pub const BODY_BYTES_PER_ACTION: usize = 2048;

/// Smallest derived request body limit.
pub const MIN_BODY_BYTES: usize = 64 * 1024;

/// Configuration for the sync server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP transport binds to.
    pub bind_addr: SocketAddr,
    /// Unix socket path. When set, the socket transport is served
    /// instead of HTTP.
    pub socket_path: Option<PathBuf>,
    /// Maximum number of actions accepted in one batch.
    pub max_batch_actions: usize,
    /// Maximum HTTP request body size. Derived from `max_batch_actions`
    /// when unset, see [`ServerConfig::body_limit`].
    pub max_body_bytes: Option<usize>,
}

impl ServerConfig {
    /// Creates a new server configuration.
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            socket_path: None,
            max_batch_actions: 1000,
            max_body_bytes: None,
        }
    }

    /// Serves the line-delimited socket transport at `path`.
    pub fn with_socket_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.socket_path = Some(path.into());
        self
    }

    /// Sets the maximum batch size.
    pub fn with_max_batch_actions(mut self, max: usize) -> Self {
        self.max_batch_actions = max;
        self
    }

    /// Sets an explicit request body limit in bytes.
    pub fn with_max_body_bytes(mut self, max: usize) -> Self {
        self.max_body_bytes = Some(max);
        self
    }

    /// Returns the HTTP request body limit in bytes.
    ///
    /// Without an explicit limit this is `max_batch_actions` times
    /// [`BODY_BYTES_PER_ACTION`], but never below [`MIN_BODY_BYTES`].
    pub fn body_limit(&self) -> usize {
        self.max_body_bytes.unwrap_or_else(|| {
            self.max_batch_actions
                .saturating_mul(BODY_BYTES_PER_ACTION)
                .max(MIN_BODY_BYTES)
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([0, 0, 0, 0], 3000)))
    }
}
