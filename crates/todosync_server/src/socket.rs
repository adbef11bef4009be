//! Unix domain socket transport.

use crate::error::ServerResult;
use crate::lines::serve_lines;
use crate::reconciler::Reconciler;
use std::future::Future;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use tokio::net::UnixListener;
use tracing::{info, warn};

/// Serves the line-delimited transport on a Unix socket until `shutdown`
/// resolves.
///
/// A stale socket file at `path` is replaced. Each connection runs in its
/// own task; a failing connection is logged and closed without affecting
/// the listener. The socket file is removed on shutdown.
pub async fn serve_socket(
    path: &Path,
    reconciler: Arc<Reconciler>,
    shutdown: impl Future<Output = ()>,
) -> ServerResult<()> {
    remove_socket_file(path)?;
    let listener = UnixListener::bind(path)?;
    info!(path = %path.display(), "listening on unix socket");

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            accepted = listener.accept() => {
                let stream = match accepted {
                    Ok((stream, _)) => stream,
                    Err(err) => {
                        warn!(error = %err, "accept failed");
                        continue;
                    }
                };
                let reconciler = Arc::clone(&reconciler);
                tokio::spawn(async move {
                    if let Err(err) = serve_lines(stream, reconciler).await {
                        warn!(error = %err, "closing socket connection");
                    }
                });
            }
        }
    }

    drop(listener);
    remove_socket_file(path)?;
    info!(path = %path.display(), "unix socket server stopped");
    Ok(())
}

fn remove_socket_file(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Err(err) if err.kind() != ErrorKind::NotFound => Err(err),
        _ => Ok(()),
    }
}
