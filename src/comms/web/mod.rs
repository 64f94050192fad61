//! Axum-based web channel: the question page plus a small JSON API.
//!
//! ## URL layout
//!
//! ```text
//! GET  /                  → page; answers `?question=` when non-empty
//! POST /                  → page; answers the form field `question`
//! POST /api/ask           → {"question"} → {"answer"}
//! GET  /api/health
//! GET  /favicon.ico       → 204
//! ```
//!
//! `run()` drives the axum event loop; the [`CancellationToken`] is wired to
//! axum's graceful shutdown.

mod api;
mod page;

use std::sync::Arc;

use axum::{Router, http::StatusCode, routing::{get, post}};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::AppError;

use super::state::AskState;
use super::{Channel, ChannelFuture};

pub struct WebChannel {
    channel_id: String,
    bind_addr: String,
    state: Arc<AskState>,
}

impl WebChannel {
    pub fn new(
        channel_id: impl Into<String>,
        bind_addr: impl Into<String>,
        state: Arc<AskState>,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            bind_addr: bind_addr.into(),
            state,
        }
    }
}

impl Channel for WebChannel {
    fn id(&self) -> &str {
        &self.channel_id
    }

    fn run(self: Box<Self>, shutdown: CancellationToken) -> ChannelFuture {
        Box::pin(run_web(self.channel_id, self.bind_addr, self.state, shutdown))
    }
}

async fn run_web(
    channel_id: String,
    bind_addr: String,
    state: Arc<AskState>,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let router = build_router(state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| AppError::Comms(format!("bind failed on {bind_addr}: {e}")))?;
    let local = listener.local_addr()?;

    info!(%channel_id, %local, "web channel listening");
    println!("Open http://{local}/ in a browser (Ctrl-C to quit)");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| AppError::Comms(format!("web server error: {e}")))?;

    info!(%channel_id, "web channel shut down");
    Ok(())
}

/// Router over the shared state. Public so it can be driven in-process.
pub fn build_router(state: Arc<AskState>) -> Router {
    Router::new()
        .route("/", get(page::show).post(page::submit))
        .route("/api/ask", post(api::ask))
        .route("/api/health", get(api::health))
        .route("/favicon.ico", get(|| async { StatusCode::NO_CONTENT }))
        .with_state(state)
}
