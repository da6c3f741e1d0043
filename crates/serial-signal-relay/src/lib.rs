//! serial-signal-relay library crate.
//!
//! This crate provides a relay server that lets browser peers exchange WebRTC
//! signaling messages and streams the output of a serial device to every
//! connected browser as `log` events.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Browsers (JSON over WebSocket, TLS)        Serial device (115200 baud)
//!         ↕                                          ↓
//! [serial-signal-relay]
//!   ├── domain/           Pure types: ClientId, ClientRegistry, wire frames, RelayConfig
//!   ├── application/      Fan-out rule and the hub task that owns the registry
//!   └── infrastructure/
//!         ├── ws_server/     HTTPS listener, static files, WebSocket sessions (axum)
//!         ├── tls/           Certificate/key loading (rustls)
//!         └── serial_bridge/ Serial device reader (tokio-serial)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async.
//! - `application` depends on `domain` and `tokio::sync` only.
//! - `infrastructure` depends on all other layers plus `axum` and `tokio-serial`.

/// Domain layer: pure types (no I/O).
pub mod domain;

/// Application layer: broadcast rules and the hub.
pub mod application;

/// Infrastructure layer: HTTPS/WebSocket listener and serial bridge.
pub mod infrastructure;
