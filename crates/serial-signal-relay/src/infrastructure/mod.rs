//! Infrastructure layer for serial-signal-relay.
//!
//! All I/O lives here: the HTTPS listener and WebSocket sessions, certificate
//! loading, and the serial device.
//!
//! # Responsibilities
//!
//! - Loading `cert.pem` / `key.pem` and binding the TLS listener
//! - Serving static assets and upgrading `/ws` to WebSocket sessions
//! - Spawning per-session Tokio tasks
//! - Opening and reading the serial device
//!
//! # What does NOT belong here?
//!
//! - Broadcast rules (application layer)
//! - Wire frame types (domain layer)
//! - CLI parsing (done in `main.rs`)

pub mod serial_bridge;
pub mod tls;
pub mod ws_server;

pub use serial_bridge::{SerialBridge, SerialError, SerialState};
pub use ws_server::{run_server, RelayServer};
