//! Application layer for serial-signal-relay.
//!
//! Knows *what* to do with connects, disconnects, signaling frames and serial
//! text; leaves sockets and devices to the infrastructure layer.
//!
//! # Responsibilities
//!
//! - Deciding who receives a broadcast ([`fanout`])
//! - Owning the client registry and performing broadcasts ([`hub`])
//!
//! # What does NOT belong here?
//!
//! - Accepting connections or WebSocket framing (infrastructure)
//! - Opening or reading the serial device (infrastructure)

pub mod fanout;
pub mod hub;

pub use fanout::delivery_targets;
pub use hub::{Hub, HubClosed, HubCommand, HubHandle};
