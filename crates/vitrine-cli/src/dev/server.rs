//! Development server with live reload via Server-Sent Events.

use crate::dev::dispatch::{dispatch, serve_static};
use crate::dev::{DevConfig, DevEvent, SharedState};
use crate::error::{CliError, Result};
use axum::{
    Router,
    extract::State,
    http::header,
    middleware,
    response::{IntoResponse, Sse, sse::Event},
    routing::get,
};
use rust_embed::RustEmbed;
use std::convert::Infallible;
use tokio_stream::{Stream, StreamExt, wrappers::ReceiverStream};
use tower_http::cors::{Any, CorsLayer};

#[derive(RustEmbed)]
#[folder = "assets/dev"]
struct DevAssets;

/// SSE endpoint for live-reload events.
pub const SSE_PATH: &str = "/__vitrine_sse__";

/// Live-reload client script.
pub const RELOAD_SCRIPT_PATH: &str = "/__vitrine_reload__.js";

/// Development server.
pub struct DevServer {
    config: DevConfig,
    state: SharedState,
}

impl DevServer {
    pub fn new(config: DevConfig, state: SharedState) -> Self {
        Self { config, state }
    }

    /// Bind and serve until the task is dropped.
    ///
    /// # Errors
    ///
    /// Returns error if server cannot bind to configured address
    pub async fn start(self) -> Result<()> {
        let addr = self.config.addr;
        let app = build_router(self.state);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| CliError::Server(format!("Failed to bind to {}: {}", addr, e)))?;

        tracing::debug!(%addr, "listening");

        axum::serve(listener, app)
            .await
            .map_err(|e| CliError::Server(format!("Server error: {}", e)))?;

        Ok(())
    }
}

/// Build the axum router: internal endpoints, the dispatcher and the static
/// fallback.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route(SSE_PATH, get(handle_sse))
        .route(RELOAD_SCRIPT_PATH, get(handle_reload_script))
        .fallback(serve_static)
        .layer(middleware::from_fn_with_state(state.clone(), dispatch))
        .layer(
            // Local development only
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Unregisters an SSE client when its stream is dropped.
struct ClientGuard {
    id: usize,
    state: SharedState,
}

impl Drop for ClientGuard {
    fn drop(&mut self) {
        self.state.unregister_client(self.id);
        tracing::debug!(client = self.id, "live-reload client disconnected");
        self.state
            .publish(&DevEvent::ClientDisconnected { id: self.id });
    }
}

/// Handle SSE connections for reload events.
async fn handle_sse(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let (id, rx) = state.register_client();
    tracing::debug!(client = id, "live-reload client connected");

    state.broadcast(&DevEvent::ClientConnected { id }).await;

    let guard = ClientGuard { id, state };
    let stream = ReceiverStream::new(rx).map(move |data| {
        let _guard = &guard;
        Ok(Event::default().data(data))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(std::time::Duration::from_secs(15))
            .text("ping"),
    )
}

/// Serve the reload client script.
async fn handle_reload_script() -> impl IntoResponse {
    let script = DevAssets::get("reload-client.js")
        .map(|file| file.data.into_owned())
        .unwrap_or_default();

    (
        [
            (header::CONTENT_TYPE, "application/javascript"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        script,
    )
}
