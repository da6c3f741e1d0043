//! Domain layer for serial-signal-relay.
//!
//! Pure types with no dependencies on sockets, serial devices, or the async
//! runtime.
//!
//! # What belongs in the domain layer?
//!
//! - Client identity and the client registry
//! - Wire frame types (the JSON "language" between browser and relay)
//! - Configuration structures
//!
//! # What does NOT belong here?
//!
//! - Any `tokio`, `axum`, or serial port types
//! - File I/O or environment variable reading

pub mod client;
pub mod config;
pub mod messages;
pub mod registry;

pub use client::ClientId;
pub use config::{RelayConfig, SerialConfig, TlsConfig};
pub use messages::{EventKind, FrameError, InboundFrame};
pub use registry::ClientRegistry;
