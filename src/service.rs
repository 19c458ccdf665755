//! HTTP surface the host platform calls when a visitor opens the chat tab.
//!
//! - `GET /health` → `200 ok`
//! - `POST /api/v1/chat/launch` with the `{course, user}` bundle →
//!   `200 {"room_url": ..., "error": null | "..."}`
//!
//! Authentication is the host's concern; the listener binds to loopback only.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Instrument};

use crate::chat::ChatTransport;
use crate::config::ChatConfig;
use crate::models::launch::LaunchOutcome;
use crate::tab::open_chat_tab;
use crate::{AppError, Result};

/// Shared state for launch requests.
#[derive(Clone)]
pub struct ServiceState {
    /// Chat server settings.
    pub config: Arc<ChatConfig>,
    /// Transport shared by every launch.
    pub transport: Arc<dyn ChatTransport>,
}

/// Handler for `GET /health`.
async fn health() -> &'static str {
    "ok"
}

/// Handler for `POST /api/v1/chat/launch`.
async fn launch(
    State(state): State<ServiceState>,
    Json(bundle): Json<Value>,
) -> Json<LaunchOutcome> {
    let span = info_span!("chat_launch", course_key = course_key_of(&bundle));
    let outcome = open_chat_tab(&bundle, &state.config, Arc::clone(&state.transport))
        .instrument(span)
        .await;
    Json(outcome)
}

fn course_key_of(bundle: &Value) -> &str {
    bundle
        .pointer("/course/key")
        .and_then(Value::as_str)
        .unwrap_or("")
}

/// Build the service router.
#[must_use]
pub fn router(state: ServiceState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/chat/launch", post(launch))
        .with_state(state)
}

/// Bind `127.0.0.1:<port>` and serve until `ct` is cancelled.
///
/// # Errors
///
/// Returns `AppError::Http` if the listener cannot be bound or the server
/// fails.
pub async fn serve(port: u16, state: ServiceState, ct: CancellationToken) -> Result<()> {
    let bind = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(bind)
        .await
        .map_err(|err| AppError::Http(format!("failed to bind {bind}: {err}")))?;
    serve_on(listener, state, ct).await
}

/// Serve on an already-bound listener until `ct` is cancelled.
///
/// # Errors
///
/// Returns `AppError::Http` if the server fails.
pub async fn serve_on(
    listener: TcpListener,
    state: ServiceState,
    ct: CancellationToken,
) -> Result<()> {
    let bind = listener
        .local_addr()
        .map_err(|err| AppError::Io(format!("listener has no local address: {err}")))?;
    info!(%bind, "starting chat tab service");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { ct.cancelled().await })
        .await
        .map_err(|err| AppError::Http(format!("chat tab service error: {err}")))?;

    info!("chat tab service shut down");
    Ok(())
}
