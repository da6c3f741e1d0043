//! The set of currently connected clients.
//!
//! The registry maps each [`ClientId`] to an outbound handle `T`.  The domain
//! layer does not care what `T` is; the hub stores the sending half of each
//! session's outbound queue there.
//!
//! # Invariant
//!
//! The registry reflects exactly the set of open WebSocket sessions.  The only
//! mutations are [`add`](ClientRegistry::add) on upgrade and
//! [`remove`](ClientRegistry::remove) on close.
//!
//! # Ownership
//!
//! The registry is owned by a single task (the hub), so it needs no `Mutex`.

use std::collections::HashMap;

use crate::domain::client::ClientId;

/// In-memory registry of connected clients.
#[derive(Debug)]
pub struct ClientRegistry<T> {
    clients: HashMap<ClientId, T>,
}

impl<T> Default for ClientRegistry<T> {
    fn default() -> Self {
        Self {
            clients: HashMap::new(),
        }
    }
}

impl<T> ClientRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a client.  Returns `false` if the id was already present,
    /// in which case the existing handle is left untouched.
    pub fn add(&mut self, id: ClientId, handle: T) -> bool {
        if self.contains(id) {
            return false;
        }
        self.clients.insert(id, handle);
        true
    }

    /// Removes a client, returning its handle if it was registered.
    pub fn remove(&mut self, id: ClientId) -> Option<T> {
        self.clients.remove(&id)
    }

    /// Number of connected clients.
    pub fn size(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn contains(&self, id: ClientId) -> bool {
        self.clients.contains_key(&id)
    }

    /// Iterates over registered ids in unspecified order.
    pub fn ids(&self) -> impl Iterator<Item = ClientId> + '_ {
        self.clients.keys().copied()
    }

    pub fn get(&self, id: ClientId) -> Option<&T> {
        self.clients.get(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_starts_empty() {
        let registry: ClientRegistry<()> = ClientRegistry::new();
        assert_eq!(registry.size(), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_add_increments_size() {
        let mut registry = ClientRegistry::new();
        let id = ClientId::new();

        assert!(registry.add(id, ()));

        assert_eq!(registry.size(), 1);
        assert!(registry.contains(id));
    }

    #[test]
    fn test_add_same_id_twice_is_rejected() {
        let mut registry = ClientRegistry::new();
        let id = ClientId::new();
        registry.add(id, "first");

        assert!(!registry.add(id, "second"));

        assert_eq!(registry.size(), 1);
        assert_eq!(registry.get(id), Some(&"first"));
    }

    #[test]
    fn test_remove_returns_handle_and_decrements_size() {
        let mut registry = ClientRegistry::new();
        let id = ClientId::new();
        registry.add(id, 7u8);

        assert_eq!(registry.remove(id), Some(7));
        assert_eq!(registry.size(), 0);
        assert!(!registry.contains(id));
    }

    #[test]
    fn test_remove_unknown_id_is_noop() {
        let mut registry: ClientRegistry<()> = ClientRegistry::new();
        registry.add(ClientId::new(), ());

        assert_eq!(registry.remove(ClientId::new()), None);
        assert_eq!(registry.size(), 1);
    }

    #[test]
    fn test_size_tracks_interleaved_connects_and_disconnects() {
        // Model the open-session set alongside the registry and compare after
        // every step.
        let mut registry = ClientRegistry::new();
        let mut open: Vec<ClientId> = Vec::new();

        for step in 0..50u32 {
            if step % 3 == 2 && !open.is_empty() {
                let id = open.remove((step as usize) % open.len());
                registry.remove(id);
            } else {
                let id = ClientId::new();
                registry.add(id, ());
                open.push(id);
            }
            assert_eq!(registry.size(), open.len(), "mismatch at step {step}");
        }

        let mut ids: Vec<_> = registry.ids().collect();
        ids.sort();
        open.sort();
        assert_eq!(ids, open);
    }
}
