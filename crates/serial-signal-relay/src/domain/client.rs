//! Per-connection client identity.

use std::fmt;

use uuid::Uuid;

/// Opaque identifier assigned to a browser when its WebSocket upgrade
/// completes.
///
/// A fresh UUID v4 is generated for every connection; a browser that
/// reconnects gets a new identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(Uuid);

impl ClientId {
    /// Generates a new random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form keeps log lines readable; collisions in the first
        // 8 hex digits only affect logs, never routing.
        let simple = self.0.simple().to_string();
        f.write_str(&simple[..8])
    }
}
