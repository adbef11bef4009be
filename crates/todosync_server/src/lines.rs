//! Newline-delimited JSON transport over any byte stream.

use crate::error::{ServerError, ServerResult};
use crate::reconciler::Reconciler;
use std::sync::Arc;
use todosync_protocol::{decode_request_line, encode_response_line};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::debug;

/// Serves request/response line pairs on one connection until the peer
/// closes it.
///
/// Blank lines are skipped. A decode or reconciliation error ends the
/// connection with that error; other connections are unaffected.
pub async fn serve_lines<S>(stream: S, reconciler: Arc<Reconciler>) -> ServerResult<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut lines = BufReader::new(reader).lines();
    let mut served = 0u64;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let request = decode_request_line(&line)?;
        let reconciler = Arc::clone(&reconciler);
        let response = tokio::task::spawn_blocking(move || reconciler.handle(request))
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))??;

        writer.write_all(&encode_response_line(&response)?).await?;
        writer.flush().await?;
        served += 1;
    }

    debug!(served, "connection closed by peer");
    Ok(())
}
