//! Main sync server.

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::reconciler::Reconciler;
use std::future::Future;
use std::sync::Arc;
use todosync_protocol::{SyncRequest, SyncResponse};
use todosync_store::EntityStore;

/// The sync server.
///
/// Owns the reconciler and starts whichever transport the configuration
/// selects: the Unix socket when `socket_path` is set, HTTP otherwise.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use todosync_protocol::{ActionToSync, SyncRequest};
/// use todosync_server::{ServerConfig, SyncServer};
/// use todosync_store::MemoryStore;
///
/// let server = SyncServer::new(Arc::new(MemoryStore::new()), ServerConfig::default());
/// let request = SyncRequest::new("phone", vec![ActionToSync::add(1, -1, "milk", false)]);
/// let response = server.handle(request).unwrap();
/// assert_eq!(response.todos.len(), 1);
/// ```
pub struct SyncServer {
    config: ServerConfig,
    reconciler: Arc<Reconciler>,
}

impl SyncServer {
    /// Creates a server over a store.
    pub fn new(store: Arc<dyn EntityStore>, config: ServerConfig) -> Self {
        let reconciler = Arc::new(Reconciler::new(store, config.clone()));
        Self { config, reconciler }
    }

    /// Returns the shared reconciler.
    pub fn reconciler(&self) -> Arc<Reconciler> {
        Arc::clone(&self.reconciler)
    }

    /// Handles one request in-process, bypassing any transport.
    pub fn handle(&self, request: SyncRequest) -> ServerResult<SyncResponse> {
        self.reconciler.handle(request)
    }

    /// Runs the configured transport until `shutdown` resolves.
    pub async fn run(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> ServerResult<()> {
        if let Some(path) = &self.config.socket_path {
            return self.run_socket(path, shutdown).await;
        }

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;
        crate::http::serve(listener, self.reconciler(), shutdown).await
    }

    #[cfg(unix)]
    async fn run_socket(
        &self,
        path: &std::path::Path,
        shutdown: impl Future<Output = ()>,
    ) -> ServerResult<()> {
        crate::socket::serve_socket(path, self.reconciler(), shutdown).await
    }

    #[cfg(not(unix))]
    async fn run_socket(
        &self,
        _path: &std::path::Path,
        _shutdown: impl Future<Output = ()>,
    ) -> ServerResult<()> {
        Err(crate::error::ServerError::InvalidRequest(
            "unix sockets are not supported on this platform".into(),
        ))
    }
}
