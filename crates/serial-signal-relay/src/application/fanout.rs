//! Who receives a broadcast.
//!
//! Signaling frames go to everyone except the sender; serial `log` frames go
//! to everyone.  Both cases are one pure function so the exclusion rule can be
//! tested without sockets or tasks.

use crate::domain::{ClientId, ClientRegistry};

/// Returns the clients that should receive a broadcast.
///
/// - `sender = Some(id)`: every registered client except `id`.
/// - `sender = None`: every registered client (relay-originated events).
///
/// A sender that is not (or no longer) registered excludes nobody.
pub fn delivery_targets<T>(registry: &ClientRegistry<T>, sender: Option<ClientId>) -> Vec<ClientId> {
    registry
        .ids()
        .filter(|id| Some(*id) != sender)
        .collect()
}
