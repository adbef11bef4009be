//! HTTP transport.
//!
//! One route at `/`:
//! - `POST` runs a sync batch (JSON in, JSON out)
//! - `GET` returns a plain-text hint
//! - `OPTIONS` is answered by the CORS layer as a preflight
//! - anything else is 405
//!
//! Every response carries `Access-Control-Allow-Origin: *`. A body larger
//! than [`ServerConfig::body_limit`](crate::ServerConfig::body_limit) is
//! refused with 413 before it is decoded.

use crate::error::ServerResult;
use crate::reconciler::Reconciler;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use todosync_protocol::{decode_request, encode_response};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Body returned for `GET /`.
pub const USAGE_HINT: &str = "This API expects POST requests";

/// Builds the router.
pub fn router(reconciler: Arc<Reconciler>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let body_limit = DefaultBodyLimit::max(reconciler.config().body_limit());

    Router::new()
        .route("/", get(usage_hint).post(sync))
        .layer(body_limit)
        .layer(cors)
        .with_state(reconciler)
}

/// Serves HTTP on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    reconciler: Arc<Reconciler>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> ServerResult<()> {
    let addr = listener.local_addr()?;
    info!(addr = %addr, "listening for HTTP");

    axum::serve(listener, router(reconciler))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

async fn usage_hint() -> &'static str {
    USAGE_HINT
}

/// POST / - reconciles one batch.
async fn sync(State(reconciler): State<Arc<Reconciler>>, body: Bytes) -> Response {
    let request = match decode_request(&body) {
        Ok(request) => request,
        Err(err) => {
            warn!(error = %err, "rejecting undecodable request");
            return (StatusCode::BAD_REQUEST, format!("Error parsing JSON: {err}")).into_response();
        }
    };

    let result = tokio::task::spawn_blocking(move || reconciler.handle(request)).await;
    let response = match result {
        Ok(Ok(response)) => response,
        Ok(Err(err)) => {
            warn!(error = %err, "batch rejected");
            return (StatusCode::BAD_REQUEST, format!("Error from sync: {err}")).into_response();
        }
        Err(err) => {
            warn!(error = %err, "reconciliation task failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("Internal error: {err}"))
                .into_response();
        }
    };

    match encode_response(&response) {
        Ok(bytes) => ([(header::CONTENT_TYPE, "application/json")], bytes).into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error encoding response: {err}"),
        )
            .into_response(),
    }
}
