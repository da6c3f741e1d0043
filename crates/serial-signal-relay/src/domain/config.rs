//! Relay configuration types.
//!
//! [`RelayConfig`] is the single source of truth for all runtime settings.
//! Its `Default` reproduces the fixed constants the relay has always shipped
//! with (port 3000, `key.pem`/`cert.pem`, `public/`, one serial device at
//! 115200 baud).  `main.rs` is responsible for populating it from CLI
//! arguments or environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Default HTTPS/WebSocket listener port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default serial device path.
pub const DEFAULT_SERIAL_PATH: &str = "/dev/cu.usbmodem14011";

/// Default serial baud rate.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// All runtime configuration for the relay.
///
/// # Example
///
/// ```rust
/// use serial_signal_relay::domain::RelayConfig;
///
/// let cfg = RelayConfig::default();
/// assert_eq!(cfg.bind_addr.port(), 3000);
/// assert!(cfg.tls.is_some());
/// ```
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Address the HTTPS listener binds to.
    pub bind_addr: SocketAddr,

    /// Certificate and key for TLS.
    ///
    /// `None` serves plain HTTP/WS, which browsers only accept for
    /// `localhost` when media devices are involved.  Used for development
    /// and tests.
    pub tls: Option<TlsConfig>,

    /// Directory served at `/`.
    pub static_dir: PathBuf,

    /// The single serial device bridged to clients.
    pub serial: SerialConfig,
}

/// PEM file locations for the TLS listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

/// Serial device settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// OS device path, e.g. `/dev/ttyACM0` or `COM3`.
    pub path: String,
    pub baud_rate: u32,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            cert_path: PathBuf::from("cert.pem"),
            key_path: PathBuf::from("key.pem"),
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_SERIAL_PATH.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

impl Default for RelayConfig {
    /// | Field       | Default                  |
    /// |-------------|--------------------------|
    /// | bind_addr   | `0.0.0.0:3000`           |
    /// | tls         | `cert.pem` / `key.pem`   |
    /// | static_dir  | `public`                 |
    /// | serial      | `/dev/cu.usbmodem14011` @ 115200 |
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            tls: Some(TlsConfig::default()),
            static_dir: PathBuf::from("public"),
            serial: SerialConfig::default(),
        }
    }
}

impl RelayConfig {
    /// URL scheme browsers should use to reach the listener.
    pub fn scheme(&self) -> &'static str {
        if self.tls.is_some() {
            "https"
        } else {
            "http"
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
