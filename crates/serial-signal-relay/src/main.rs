//! serial-signal-relay — entry point.
//!
//! Serves a browser app over HTTPS, relays WebRTC signaling (`offer`,
//! `answer`, `ice-candidate`) between every connected browser, and streams a
//! serial device's output to all of them as `log` events.
//!
//! # Usage
//!
//! ```text
//! serial-signal-relay [OPTIONS]
//!
//! Options:
//!   --bind          <IP>    Listener bind address [default: 0.0.0.0]
//!   --port          <PORT>  Listener port [default: 3000]
//!   --cert          <PATH>  TLS certificate (PEM) [default: cert.pem]
//!   --key           <PATH>  TLS private key (PEM) [default: key.pem]
//!   --insecure-http         Serve plain HTTP/WS instead of TLS
//!   --static-dir    <DIR>   Directory served at / [default: public]
//!   --serial-path   <PATH>  Serial device [default: /dev/cu.usbmodem14011]
//!   --baud-rate     <BAUD>  Serial baud rate [default: 115200]
//! ```
//!
//! Running with no options reproduces the fixed deployment: HTTPS on port
//! 3000 with `key.pem`/`cert.pem` from the working directory.
//!
//! # Environment variable overrides
//!
//! | Variable              | Default                  |
//! |-----------------------|--------------------------|
//! | `RELAY_BIND`          | `0.0.0.0`                |
//! | `RELAY_PORT`          | `3000`                   |
//! | `RELAY_CERT`          | `cert.pem`               |
//! | `RELAY_KEY`           | `key.pem`                |
//! | `RELAY_INSECURE_HTTP` | unset (TLS on)           |
//! | `RELAY_STATIC_DIR`    | `public`                 |
//! | `RELAY_SERIAL_PATH`   | `/dev/cu.usbmodem14011`  |
//! | `RELAY_BAUD_RATE`     | `115200`                 |

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use axum_server::Handle;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use serial_signal_relay::domain::config::{DEFAULT_BAUD_RATE, DEFAULT_PORT, DEFAULT_SERIAL_PATH};
use serial_signal_relay::domain::{RelayConfig, SerialConfig, TlsConfig};
use serial_signal_relay::infrastructure::run_server;

/// Grace period for open sessions after Ctrl+C.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

// ── CLI argument definitions ──────────────────────────────────────────────────

/// WebRTC signaling relay with a serial-port log bridge.
#[derive(Debug, Parser)]
#[command(
    name = "serial-signal-relay",
    about = "WebRTC signaling relay and serial-port log bridge for browser clients",
    version
)]
struct Cli {
    /// IP address to bind the HTTPS listener to.
    #[arg(long, default_value = "0.0.0.0", env = "RELAY_BIND")]
    bind: String,

    /// Listener port.
    #[arg(long, default_value_t = DEFAULT_PORT, env = "RELAY_PORT")]
    port: u16,

    /// TLS certificate chain (PEM).
    #[arg(long, default_value = "cert.pem", env = "RELAY_CERT")]
    cert: PathBuf,

    /// TLS private key (PEM).
    #[arg(long, default_value = "key.pem", env = "RELAY_KEY")]
    key: PathBuf,

    /// Serve plain HTTP/WS instead of TLS.
    ///
    /// Browsers only grant media access to `localhost` over plain HTTP, so
    /// this is for local development.
    #[arg(long, env = "RELAY_INSECURE_HTTP")]
    insecure_http: bool,

    /// Directory of static assets served at `/`.
    #[arg(long, default_value = "public", env = "RELAY_STATIC_DIR")]
    static_dir: PathBuf,

    /// Serial device to bridge.
    #[arg(long, default_value = DEFAULT_SERIAL_PATH, env = "RELAY_SERIAL_PATH")]
    serial_path: String,

    /// Serial baud rate.
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE, env = "RELAY_BAUD_RATE")]
    baud_rate: u32,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`RelayConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if `--bind` is not a valid IP address.
    fn into_relay_config(self) -> anyhow::Result<RelayConfig> {
        let ip: IpAddr = self
            .bind
            .parse()
            .with_context(|| format!("invalid bind address: '{}'", self.bind))?;

        let tls = if self.insecure_http {
            None
        } else {
            Some(TlsConfig {
                cert_path: self.cert,
                key_path: self.key,
            })
        };

        Ok(RelayConfig {
            bind_addr: SocketAddr::new(ip, self.port),
            tls,
            static_dir: self.static_dir,
            serial: SerialConfig {
                path: self.serial_path,
                baud_rate: self.baud_rate,
            },
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `RUST_LOG` overrides the default `info` level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_relay_config()?;

    info!(
        "serial-signal-relay starting — {}://{}, serial={} @ {} baud",
        config.scheme(),
        config.bind_addr,
        config.serial.path,
        config.serial.baud_rate
    );

    let handle = Handle::new();

    let shutdown = handle.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C — shutting down listener");
                shutdown.graceful_shutdown(Some(SHUTDOWN_GRACE));
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    run_server(config, handle).await?;

    info!("serial-signal-relay stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
