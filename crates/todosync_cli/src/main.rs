//! todosync server launcher
//!
//! Opens the todo store and serves the sync endpoint over HTTP, or over a
//! Unix socket when `--socket-path` is given.

use clap::{ArgGroup, Parser};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use todosync_server::{ServerConfig, SyncServer};
use todosync_store::{DatabaseConfig, EntityStore, MemoryStore, SqliteStore};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Offline-sync backend for a shared todo list.
#[derive(Parser)]
#[command(name = "todosync-server")]
#[command(author, version, about, long_about = None)]
#[command(group(
    ArgGroup::new("store")
        .required(true)
        .args(["db_config_path", "in_memory_db"])
))]
struct Cli {
    /// Path to the database credential file (JSON)
    #[arg(long)]
    db_config_path: Option<PathBuf>,

    /// Keep all data in memory; nothing survives a restart
    #[arg(long)]
    in_memory_db: bool,

    /// Serve newline-delimited JSON on this Unix socket instead of HTTP
    #[arg(long)]
    socket_path: Option<PathBuf>,

    /// Address for the HTTP listener
    #[arg(long, default_value = "0.0.0.0:3000")]
    bind: SocketAddr,

    /// Maximum number of actions accepted in one request
    #[arg(long, default_value = "1000")]
    max_batch_actions: usize,

    /// Maximum HTTP request body in bytes (default: derived from the
    /// batch limit)
    #[arg(long)]
    max_body_bytes: Option<usize>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn open_store(cli: &Cli) -> Result<Arc<dyn EntityStore>, Box<dyn std::error::Error>> {
    match &cli.db_config_path {
        Some(path) => {
            let config = DatabaseConfig::load(path)?;
            let store = SqliteStore::open_with_config(&config)?;
            info!(path = %config.database_path().display(), "opened sqlite store");
            Ok(Arc::new(store))
        }
        None => {
            info!("using in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Resolves once `signal` fires. If the signal handler cannot be
/// installed the server keeps running until the process is killed.
async fn wait_for_shutdown(signal: impl Future<Output = io::Result<()>>) {
    match signal.await {
        Ok(()) => info!("shutdown requested"),
        Err(err) => {
            warn!(error = %err, "cannot listen for ctrl-c, running until killed");
            std::future::pending::<()>().await;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let store = open_store(&cli)?;

    let mut config = ServerConfig::new(cli.bind).with_max_batch_actions(cli.max_batch_actions);
    if let Some(path) = &cli.socket_path {
        config = config.with_socket_path(path);
    }
    if let Some(max) = cli.max_body_bytes {
        config = config.with_max_body_bytes(max);
    }

    SyncServer::new(store, config)
        .run(wait_for_shutdown(tokio::signal::ctrl_c()))
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn shutdown_follows_the_signal() {
        wait_for_shutdown(async { Ok(()) }).await;
    }

    #[tokio::test]
    async fn failed_signal_handler_does_not_shut_down() {
        let failed = async { Err(io::Error::other("no signal support")) };
        let result =
            tokio::time::timeout(Duration::from_millis(50), wait_for_shutdown(failed)).await;
        assert!(result.is_err());
    }

    #[test]
    fn exactly_one_store_option_is_required() {
        assert!(Cli::try_parse_from(["todosync-server"]).is_err());
        assert!(Cli::try_parse_from([
            "todosync-server",
            "--in-memory-db",
            "--db-config-path",
            "db.json",
        ])
        .is_err());

        let cli = Cli::try_parse_from(["todosync-server", "--in-memory-db"]).unwrap();
        assert_eq!(cli.bind.port(), 3000);
        assert_eq!(cli.max_batch_actions, 1000);
        assert!(cli.max_body_bytes.is_none());
    }
}
