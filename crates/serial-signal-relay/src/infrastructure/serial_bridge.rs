//! Serial device → `log` broadcast.
//!
//! The bridge opens one device at startup and forwards every chunk it reads
//! to the hub as text.  There is no framing: whatever a single `read()`
//! returns becomes one `log` frame, decoded as lossy UTF-8.
//!
//! # State machine
//!
//! ```text
//! Unopened ──open ok──► Open ──read error──► Failed
//!    │                    └────end of stream──► Closed
//!    └──────open error──────────────────────► Failed
//! ```
//!
//! There is no way back to `Open` short of restarting the process: no retry,
//! no reconnect, no device re-scan.  A failed bridge leaves the rest of the
//! relay untouched.

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::watch;
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, error, info, warn};

use crate::application::HubHandle;
use crate::domain::SerialConfig;

/// Bytes requested per `read()`.
const READ_BUF_LEN: usize = 1024;

/// Lifecycle of the serial bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerialState {
    Unopened,
    Open,
    /// The device could not be opened or reported an error.  Holds the
    /// error text for diagnostics.
    Failed(String),
    /// The device stream ended (or nobody is left to receive logs).
    Closed,
}

impl SerialState {
    /// `true` once the bridge has stopped for good.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SerialState::Failed(_) | SerialState::Closed)
    }
}

/// Device-level failures.
#[derive(Debug, Error)]
pub enum SerialError {
    #[error("failed to open serial port {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: tokio_serial::Error,
    },

    #[error("serial port read failed: {0}")]
    Read(#[from] std::io::Error),
}

/// Opens the configured device in async (non-blocking) mode.
pub fn open_device(config: &SerialConfig) -> Result<SerialStream, SerialError> {
    tokio_serial::new(&config.path, config.baud_rate)
        .open_native_async()
        .map_err(|source| SerialError::Open {
            path: config.path.clone(),
            source,
        })
}

/// Reads `reader` until it ends or fails, publishing each chunk as a log.
///
/// Returns the terminal state the bridge ended in.
pub async fn pump<R>(mut reader: R, hub: &HubHandle) -> SerialState
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; READ_BUF_LEN];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => {
                warn!("serial device stream ended");
                return SerialState::Closed;
            }
            Ok(n) => {
                let text = String::from_utf8_lossy(&buf[..n]).into_owned();
                if hub.publish_log(text).is_err() {
                    debug!("hub stopped; serial bridge exiting");
                    return SerialState::Closed;
                }
            }
            Err(e) => {
                let err = SerialError::Read(e);
                error!("serial port error: {err}");
                return SerialState::Failed(err.to_string());
            }
        }
    }
}

/// Handle to a running (or failed) serial bridge.
#[derive(Debug, Clone)]
pub struct SerialBridge {
    state: watch::Receiver<SerialState>,
}

impl SerialBridge {
    /// Opens the configured device and starts forwarding its output.
    ///
    /// An open failure is logged and leaves the bridge in
    /// [`SerialState::Failed`]; it is never retried.
    pub fn start(config: &SerialConfig, hub: HubHandle) -> Self {
        let (tx, state) = watch::channel(SerialState::Unopened);
        match open_device(config) {
            Ok(stream) => {
                info!(
                    "serial port {} opened at {} baud",
                    config.path, config.baud_rate
                );
                spawn_pump(stream, hub, tx);
            }
            Err(e) => {
                error!("{e}");
                tx.send_replace(SerialState::Failed(e.to_string()));
            }
        }
        Self { state }
    }

    /// Forwards an already-open byte source.
    pub fn attach<R>(reader: R, hub: HubHandle) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, state) = watch::channel(SerialState::Unopened);
        spawn_pump(reader, hub, tx);
        Self { state }
    }

    pub fn state(&self) -> SerialState {
        self.state.borrow().clone()
    }

    /// Waits until the bridge reaches `Failed` or `Closed`.
    pub async fn stopped(&mut self) -> SerialState {
        match self.state.wait_for(SerialState::is_terminal).await {
            Ok(state) => state.clone(),
            // Sender dropped without a terminal state: the pump task panicked.
            Err(_) => SerialState::Failed("serial bridge task aborted".to_string()),
        }
    }
}

fn spawn_pump<R>(reader: R, hub: HubHandle, tx: watch::Sender<SerialState>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tx.send_replace(SerialState::Open);
    tokio::spawn(async move {
        let end = pump(reader, &hub).await;
        tx.send_replace(end);
    });
}

// ── Tests ─────────────────────────────────────────────────────────────────────
