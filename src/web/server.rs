//! HTTP listener lifecycle.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{router, AppState};
use crate::{AppError, Result};

/// Bind `config.http` and serve until `ct` is cancelled.
///
/// # Errors
///
/// Returns `AppError::Config` if the address is invalid or cannot be bound.
pub async fn serve(state: Arc<AppState>, ct: CancellationToken) -> Result<()> {
    let addr = state.config.http.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|err| AppError::Config(format!("failed to bind {addr}: {err}")))?;
    serve_on(listener, state, ct).await
}

/// Serve on an already-bound listener until `ct` is cancelled.
///
/// # Errors
///
/// Returns `AppError::Io` if the server loop fails.
pub async fn serve_on(
    listener: TcpListener,
    state: Arc<AppState>,
    ct: CancellationToken,
) -> Result<()> {
    let local = listener.local_addr()?;
    info!(%local, base_url = %state.config.http.base_url, "http server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { ct.cancelled().await })
        .await?;

    info!("http server stopped");
    Ok(())
}
