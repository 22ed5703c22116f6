//! HTTP server wiring for the webhook gateway.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::handler::{health, index, slack_events, AppState};
use crate::{AppError, Result};

/// Path Slack's Events API posts deliveries to.
pub const EVENTS_PATH: &str = "/slack/events";

/// Build the axum router for all inbound routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(EVENTS_PATH, post(slack_events))
        .route("/health", get(health))
        .route("/", get(index))
        .with_state(state)
}

/// Bind `config.http_host:http_port` and serve until `ct` is cancelled.
///
/// # Errors
///
/// Returns `AppError::Config` if the address is invalid or cannot be bound.
pub async fn serve(state: Arc<AppState>, ct: CancellationToken) -> Result<()> {
    let bind = state.config.bind_addr()?;
    let listener = TcpListener::bind(bind)
        .await
        .map_err(|err| AppError::Config(format!("failed to bind HTTP on {bind}: {err}")))?;
    serve_on(listener, state, ct).await
}

/// Serve on an already-bound listener until `ct` is cancelled.
///
/// Background jobs are detached and are not awaited on shutdown.
///
/// # Errors
///
/// Returns `AppError::Io` if the server loop fails.
pub async fn serve_on(
    listener: TcpListener,
    state: Arc<AppState>,
    ct: CancellationToken,
) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "starting slack webhook gateway");
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { ct.cancelled().await })
        .await
        .map_err(|err| AppError::Io(format!("HTTP server error: {err}")))?;

    info!("slack webhook gateway shut down");
    Ok(())
}
