//! The hub: single owner of the client registry.
//!
//! Every registry mutation and every broadcast goes through one Tokio task
//! that processes [`HubCommand`]s strictly in arrival order.  Each command
//! runs to completion before the next one starts, so connects, disconnects,
//! signaling relays and serial logs are serialized without a `Mutex`.
//!
//! ```text
//! ws session A ─┐                         ┌─► outbound queue A ─► ws A
//! ws session B ─┼─► HubCommand (mpsc) ─► Hub ─► outbound queue B ─► ws B
//! serial bridge ┘                         └─► outbound queue C ─► ws C
//! ```
//!
//! # Delivery
//!
//! Each session owns an unbounded outbound queue.  The hub only ever does a
//! non-blocking `send` into it, so one slow browser cannot stall the others.
//! A send that fails because the session already went away is skipped and
//! the remaining recipients are still served.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::application::fanout::delivery_targets;
use crate::domain::messages::{encode_log, encode_signal};
use crate::domain::{ClientId, ClientRegistry, EventKind, FrameError, InboundFrame};

/// An encoded text frame, shared between all recipients of one broadcast.
pub type Frame = Arc<str>;

/// Sending half of a session's outbound queue.
pub type OutboundTx = mpsc::UnboundedSender<Frame>;

/// Receiving half of a session's outbound queue.
pub type OutboundRx = mpsc::UnboundedReceiver<Frame>;

/// Commands accepted by the hub task.
#[derive(Debug)]
pub enum HubCommand {
    /// A WebSocket upgrade completed.
    Connect { id: ClientId, outbound: OutboundTx },
    /// A WebSocket session closed or failed.
    Disconnect { id: ClientId },
    /// A text frame arrived from a browser.
    Inbound { from: ClientId, text: String },
    /// Decoded text from one serial read.
    Log { text: String },
    /// Observability: current registry size.
    ClientCount { reply: oneshot::Sender<usize> },
}

/// The hub task has stopped (every [`HubHandle`] was dropped or it panicked).
#[derive(Debug, Error)]
#[error("relay hub has stopped")]
pub struct HubClosed;

/// Cheap, cloneable handle used by sessions and the serial bridge.
#[derive(Debug, Clone)]
pub struct HubHandle {
    tx: mpsc::UnboundedSender<HubCommand>,
}

impl HubHandle {
    /// Registers a new client and returns the receiving half of its outbound
    /// queue.
    pub fn connect(&self, id: ClientId) -> Result<OutboundRx, HubClosed> {
        let (outbound, rx) = mpsc::unbounded_channel();
        self.send(HubCommand::Connect { id, outbound })?;
        Ok(rx)
    }

    pub fn disconnect(&self, id: ClientId) -> Result<(), HubClosed> {
        self.send(HubCommand::Disconnect { id })
    }

    /// Hands a browser text frame to the hub for dispatch.
    pub fn inbound(&self, from: ClientId, text: String) -> Result<(), HubClosed> {
        self.send(HubCommand::Inbound { from, text })
    }

    /// Broadcasts serial text to every connected client.
    pub fn publish_log(&self, text: String) -> Result<(), HubClosed> {
        self.send(HubCommand::Log { text })
    }

    /// Asks the hub how many clients are registered.
    ///
    /// The answer reflects every command sent on this handle before the call.
    pub async fn client_count(&self) -> Result<usize, HubClosed> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::ClientCount { reply })?;
        rx.await.map_err(|_| HubClosed)
    }

    fn send(&self, cmd: HubCommand) -> Result<(), HubClosed> {
        self.tx.send(cmd).map_err(|_| HubClosed)
    }
}

/// Handler invoked for a decoded inbound frame.
type Handler = fn(&mut Hub, ClientId, InboundFrame);

/// Maps each event kind a browser may send to its handler.
fn handler_for(kind: EventKind) -> Handler {
    if kind.is_signaling() {
        Hub::relay_signal
    } else {
        Hub::reject_frame
    }
}

/// Registry owner and broadcast engine.
#[derive(Debug, Default)]
pub struct Hub {
    registry: ClientRegistry<OutboundTx>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns the hub on the current Tokio runtime.
    ///
    /// The task runs until every [`HubHandle`] clone has been dropped.
    pub fn spawn() -> HubHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(Self::new().run(rx));
        HubHandle { tx }
    }

    /// Processes commands until the channel closes.
    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<HubCommand>) {
        while let Some(cmd) = rx.recv().await {
            self.handle(cmd);
        }
        debug!("hub command channel closed; {} client(s) dropped", self.registry.size());
    }

    /// Applies one command.  Never awaits.
    pub fn handle(&mut self, cmd: HubCommand) {
        match cmd {
            HubCommand::Connect { id, outbound } => {
                if self.registry.add(id, outbound) {
                    info!("client connected: {id}, total: {}", self.registry.size());
                } else {
                    warn!("client {id} connected twice; keeping the first session");
                }
            }
            HubCommand::Disconnect { id } => {
                if self.registry.remove(id).is_some() {
                    info!("client disconnected: {id}, remaining: {}", self.registry.size());
                }
            }
            HubCommand::Inbound { from, text } => self.dispatch(from, &text),
            HubCommand::Log { text } => self.publish_log(&text),
            HubCommand::ClientCount { reply } => {
                let _ = reply.send(self.registry.size());
            }
        }
    }

    pub fn client_count(&self) -> usize {
        self.registry.size()
    }

    fn dispatch(&mut self, from: ClientId, text: &str) {
        match InboundFrame::parse(text) {
            Ok(frame) => handler_for(frame.kind)(self, from, frame),
            Err(e) => warn!("client {from}: dropping frame: {e}"),
        }
    }

    fn relay_signal(&mut self, from: ClientId, frame: InboundFrame) {
        let encoded = match encode_signal(frame.kind, frame.payload.as_deref()) {
            Ok(s) => s,
            Err(e) => {
                warn!("client {from}: could not re-encode {}: {e}", frame.kind.as_str());
                return;
            }
        };
        let delivered = self.broadcast(Some(from), Arc::from(encoded));
        debug!(
            "{} from {from} relayed to {delivered} client(s)",
            frame.kind.as_str()
        );
    }

    fn reject_frame(&mut self, from: ClientId, frame: InboundFrame) {
        warn!("client {from}: dropping frame: {}", FrameError::UnexpectedKind(frame.kind));
    }

    fn publish_log(&mut self, text: &str) {
        if self.registry.is_empty() {
            debug!("serial log ({} bytes) dropped: no clients connected", text.len());
            return;
        }
        match encode_log(text) {
            Ok(encoded) => {
                let delivered = self.broadcast(None, Arc::from(encoded));
                debug!("serial log ({} bytes) sent to {delivered} client(s)", text.len());
            }
            Err(e) => warn!("could not encode serial log: {e}"),
        }
    }

    /// Sends `frame` to every delivery target.  Returns how many queues
    /// accepted it; closed queues are skipped.
    fn broadcast(&self, sender: Option<ClientId>, frame: Frame) -> usize {
        let mut delivered = 0;
        for id in delivery_targets(&self.registry, sender) {
            let Some(outbound) = self.registry.get(id) else {
                continue;
            };
            if outbound.send(Arc::clone(&frame)).is_ok() {
                delivered += 1;
            } else {
                debug!("client {id}: outbound queue closed; skipping");
            }
        }
        delivered
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
