//! HTTP API over the reading store.
//!
//! | Route | Success | Errors |
//! |-------|---------|--------|
//! | `POST /api/readings` | 201 `{status, message, logged_data}` | 400, 500 |
//! | `GET /api/readings/latest` | 200 `{id, timestamp, pot_value}` | 404, 500 |
//!
//! Handlers share no in-memory state; each request opens the store,
//! runs one statement, and closes it again.

mod error;
mod handlers;

pub use error::ApiError;
pub use handlers::{add_reading, integer_value, latest_reading, AppendResponse};

use std::future::Future;
use std::net::SocketAddr;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{PotError, Result};
use crate::store::ReadingStore;

/// Build the API router over `store`.
pub fn router(store: ReadingStore) -> Router {
    Router::new()
        .route("/api/readings", post(add_reading))
        .route("/api/readings/latest", get(latest_reading))
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

/// Bind `addr` and serve until `shutdown` resolves.
///
/// # Errors
///
/// Returns `WebServerFailed` if the address cannot be bound.
pub async fn serve<F>(addr: SocketAddr, store: ReadingStore, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| PotError::WebServerFailed {
            addr: addr.to_string(),
            reason: e.to_string(),
        })?;
    serve_listener(listener, store, shutdown).await
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve_listener<F>(listener: TcpListener, store: ReadingStore, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let local = listener.local_addr()?;
    info!(addr = %local, db = %store.path().display(), "Reading store API listening");

    axum::serve(listener, router(store))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Reading store API stopped");
    Ok(())
}
