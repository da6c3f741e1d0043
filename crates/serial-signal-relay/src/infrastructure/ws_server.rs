//! HTTPS listener: static assets, WebSocket upgrade, per-session tasks.
//!
//! This module is responsible for:
//!
//! 1. Loading the TLS certificate/key (fatal on failure).
//! 2. Starting the serial bridge (non-fatal on failure).
//! 3. Serving `static_dir` at `/` and upgrading `GET /ws` to a WebSocket.
//! 4. Running one session per browser:
//!    - **Browser → Hub**: text frames are handed to the hub for dispatch.
//!    - **Hub → Browser**: frames from the session's outbound queue are
//!      written to the socket.
//! 5. Unregistering the client when either direction ends.
//!
//! # Scalability
//!
//! Each browser session runs in its own Tokio task.  The only shared state is
//! the [`HubHandle`], a cloneable channel sender, so sessions never contend on
//! a lock.

use std::net::SocketAddr;
use std::path::Path;

use anyhow::Context;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::http::Method;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use axum_server::Handle;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{debug, info, warn};

use crate::application::hub::OutboundRx;
use crate::application::{Hub, HubHandle};
use crate::domain::{ClientId, RelayConfig};
use crate::infrastructure::serial_bridge::SerialBridge;
use crate::infrastructure::tls::load_tls;

/// Path browsers open their WebSocket on.
pub const WS_PATH: &str = "/ws";

// ── Public API ────────────────────────────────────────────────────────────────

/// A configured relay with its hub already running.
///
/// Split from [`run_server`] so callers (and tests) can reach the hub before
/// the listener starts, e.g. to attach an alternative serial source.
pub struct RelayServer {
    config: RelayConfig,
    hub: HubHandle,
}

impl RelayServer {
    /// Spawns the hub.  Must be called inside a Tokio runtime.
    pub fn new(config: RelayConfig) -> Self {
        Self {
            config,
            hub: Hub::spawn(),
        }
    }

    pub fn hub(&self) -> HubHandle {
        self.hub.clone()
    }

    /// Loads TLS, starts the serial bridge, and serves until `handle` is
    /// shut down.
    ///
    /// # Errors
    ///
    /// Returns an error if the certificate/key cannot be loaded or the
    /// listener cannot bind.  A serial device that fails to open is logged
    /// and does not stop the server.
    pub async fn run(self, handle: Handle) -> anyhow::Result<()> {
        let tls = match &self.config.tls {
            Some(tls) => Some(load_tls(tls).await?),
            None => None,
        };

        // Keeps the bridge state alive for the lifetime of the listener.
        let _serial = SerialBridge::start(&self.config.serial, self.hub.clone());

        let addr = self.config.bind_addr;
        let scheme = self.config.scheme();
        let app = router(self.hub.clone(), &self.config.static_dir)
            .into_make_service_with_connect_info::<SocketAddr>();

        spawn_listening_log(handle.clone(), scheme);

        let served = match tls {
            Some(tls) => {
                axum_server::bind_rustls(addr, tls)
                    .handle(handle)
                    .serve(app)
                    .await
            }
            None => axum_server::bind(addr).handle(handle).serve(app).await,
        };
        served.with_context(|| format!("relay server on {addr} failed"))?;

        info!("relay listener stopped");
        Ok(())
    }
}

/// Builds a [`RelayServer`] from `config` and runs it.
///
/// # Errors
///
/// See [`RelayServer::run`].
pub async fn run_server(config: RelayConfig, handle: Handle) -> anyhow::Result<()> {
    RelayServer::new(config).run(handle).await
}

/// HTTP routes: `GET /ws` upgrades, everything else is a static file.
pub fn router(hub: HubHandle, static_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST]);

    Router::new()
        .route(WS_PATH, get(ws_upgrade))
        .fallback_service(ServeDir::new(static_dir))
        .layer(cors)
        .with_state(hub)
}

// ── Per-session handler ───────────────────────────────────────────────────────

async fn ws_upgrade(
    ws: WebSocketUpgrade,
    State(hub): State<HubHandle>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
) -> Response {
    ws.on_upgrade(move |socket| handle_session(socket, peer, hub))
}

/// Lifecycle of one browser session: register, pump both directions,
/// unregister.
async fn handle_session(socket: WebSocket, peer: SocketAddr, hub: HubHandle) {
    let id = ClientId::new();
    let outbound = match hub.connect(id) {
        Ok(rx) => rx,
        Err(e) => {
            warn!("session from {peer} rejected: {e}");
            return;
        }
    };
    debug!("session {id} established from {peer}");

    let (mut ws_tx, ws_rx) = socket.split();

    // Whichever direction finishes first ends the session; the other future
    // is dropped (and so cancelled) by `select!`.
    tokio::select! {
        _ = forward_outbound(&mut ws_tx, outbound, id) => {
            debug!("session {id}: hub→browser direction ended");
        }
        _ = read_inbound(ws_rx, &hub, id) => {
            debug!("session {id}: browser→hub direction ended");
        }
    }

    // The hub may already be gone during shutdown; nothing left to clean up.
    let _ = hub.disconnect(id);

    // Completes the closing handshake: flushes the reply to a browser's close
    // frame, or sends our own close if the browser is still there.
    if let Err(e) = ws_tx.close().await {
        debug!("session {id}: close handshake not completed: {e}");
    }
}

/// Writes queued frames to the browser until the queue or socket closes.
async fn forward_outbound(
    ws_tx: &mut SplitSink<WebSocket, Message>,
    mut outbound: OutboundRx,
    id: ClientId,
) {
    while let Some(frame) = outbound.recv().await {
        if ws_tx.send(Message::Text(frame.to_string())).await.is_err() {
            debug!("session {id}: WebSocket send failed (browser disconnected)");
            break;
        }
    }
}

/// Hands browser text frames to the hub until the socket closes.
async fn read_inbound(mut ws_rx: SplitStream<WebSocket>, hub: &HubHandle, id: ClientId) {
    while let Some(msg) = ws_rx.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if hub.inbound(id, text).is_err() {
                    debug!("session {id}: hub stopped");
                    break;
                }
            }
            Ok(Message::Binary(data)) => {
                // The protocol is JSON text only.
                warn!(
                    "session {id}: unexpected binary frame ({} bytes, ignored)",
                    data.len()
                );
            }
            Ok(Message::Ping(_) | Message::Pong(_)) => {
                // axum answers pings itself.
            }
            Ok(Message::Close(_)) => {
                debug!("session {id}: close frame received");
                break;
            }
            Err(e) => {
                debug!("session {id}: WebSocket error: {e}");
                break;
            }
        }
    }
}

/// Logs the actual bound address once the listener is up (the configured
/// port may be `0`).
fn spawn_listening_log(handle: Handle, scheme: &'static str) {
    tokio::spawn(async move {
        if let Some(addr) = handle.listening().await {
            info!("relay listening on {addr}");
            info!(
                "open {scheme}://localhost:{} in a browser; signaling at {WS_PATH}",
                addr.port()
            );
        }
    });
}

// ── Tests ─────────────────────────────────────────────────────────────────────
