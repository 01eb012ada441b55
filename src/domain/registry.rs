//! Live connection registry.
//!
//! Tracks connected drivers, users, and the single observer slot, keyed by
//! client id. Each entry holds the connection's outbound queue; "open"
//! means the queue's receiving half is still alive. Only registry mutation
//! lives here, no business logic.

use std::collections::HashMap;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::ws::messages::{PoolCounts, ServerMessage};

/// Outbound queue handle for one connection.
pub type ClientSender = mpsc::UnboundedSender<ServerMessage>;

/// A registered connection: the opaque connection id plus its outbound
/// queue.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    /// Opaque id assigned at connect time.
    pub conn_id: Uuid,
    /// Outbound message queue for this connection.
    pub sender: ClientSender,
}

impl ClientHandle {
    /// Creates a handle from a connection id and its outbound queue.
    #[must_use]
    pub const fn new(conn_id: Uuid, sender: ClientSender) -> Self {
        Self { conn_id, sender }
    }

    /// `true` while the connection task is still draining the queue.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }
}

/// Registry of live connections by role.
///
/// A client id is unique within its role; registering an id again replaces
/// the previous handle. At most one observer is registered at a time and a
/// new observer registration replaces the previous one without error.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    drivers: HashMap<String, ClientHandle>,
    users: HashMap<String, ClientHandle>,
    observer: Option<ClientHandle>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a driver id to a connection, replacing any previous binding.
    pub fn register_driver(&mut self, driver_id: &str, handle: ClientHandle) {
        self.drivers.insert(driver_id.to_string(), handle);
    }

    /// Binds a user id to a connection, replacing any previous binding.
    pub fn register_user(&mut self, user_id: &str, handle: ClientHandle) {
        self.users.insert(user_id.to_string(), handle);
    }

    /// Installs a connection as the single observer, replacing any
    /// previous one.
    pub fn register_observer(&mut self, handle: ClientHandle) {
        self.observer = Some(handle);
    }

    /// Returns the current observer handle, if any.
    #[must_use]
    pub fn observer(&self) -> Option<&ClientHandle> {
        self.observer.as_ref()
    }

    /// `true` if the driver id has an open, registered connection.
    #[must_use]
    pub fn is_driver_connected(&self, driver_id: &str) -> bool {
        self.drivers.get(driver_id).is_some_and(ClientHandle::is_open)
    }

    /// `true` if the user id has an open, registered connection.
    #[must_use]
    pub fn is_user_connected(&self, user_id: &str) -> bool {
        self.users.get(user_id).is_some_and(ClientHandle::is_open)
    }

    /// Delivers a message to the client with the given id, scanning the
    /// driver registry first, then the user registry.
    ///
    /// Returns `false` when the id is unknown or the connection is closed.
    /// Delivery failure is never fatal; the caller logs and continues.
    pub fn send_to_client(&self, client_id: &str, message: ServerMessage) -> bool {
        let handle = self
            .drivers
            .get(client_id)
            .or_else(|| self.users.get(client_id));
        if let Some(h) = handle
            && h.sender.send(message).is_ok()
        {
            return true;
        }
        tracing::warn!(client_id, "failed to send message: not found or not connected");
        false
    }

    /// Delivers a message to the observer, if one is registered and open.
    pub fn send_to_observer(&self, message: ServerMessage) -> bool {
        self.observer
            .as_ref()
            .is_some_and(|h| h.sender.send(message).is_ok())
    }

    /// Delivers a message to every currently open connection, except the
    /// one with `exclude` as its connection id. Returns the delivery count.
    pub fn broadcast_to_all(&self, message: &ServerMessage, exclude: Option<Uuid>) -> usize {
        self.drivers
            .values()
            .chain(self.users.values())
            .chain(self.observer.iter())
            .filter(|h| exclude != Some(h.conn_id))
            .filter(|h| h.sender.send(message.clone()).is_ok())
            .count()
    }

    /// Removes whatever binding the closing connection held.
    ///
    /// Matches on the connection id, not the client id: the close of a
    /// superseded connection must not evict its replacement's binding.
    pub fn unregister(&mut self, conn_id: Uuid) {
        self.drivers.retain(|_, h| h.conn_id != conn_id);
        self.users.retain(|_, h| h.conn_id != conn_id);
        if self.observer.as_ref().is_some_and(|h| h.conn_id == conn_id) {
            self.observer = None;
        }
    }

    /// Current driver/user connection counts.
    #[must_use]
    pub fn counts(&self) -> PoolCounts {
        PoolCounts {
            drivers_count: self.drivers.len(),
            users_count: self.users.len(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn open_handle() -> (ClientHandle, mpsc::UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ClientHandle::new(Uuid::new_v4(), tx), rx)
    }

    fn probe() -> ServerMessage {
        ServerMessage::StatusUpdated {
            status: "available".to_string(),
        }
    }

    #[test]
    fn send_scans_drivers_then_users() {
        let mut registry = ConnectionRegistry::new();
        let (driver, mut driver_rx) = open_handle();
        let (user, mut user_rx) = open_handle();
        registry.register_driver("d-1", driver);
        registry.register_user("u-1", user);

        assert!(registry.send_to_client("d-1", probe()));
        assert!(registry.send_to_client("u-1", probe()));
        assert!(driver_rx.try_recv().is_ok());
        assert!(user_rx.try_recv().is_ok());
    }

    #[test]
    fn send_to_unknown_client_reports_failure() {
        let registry = ConnectionRegistry::new();
        assert!(!registry.send_to_client("d-404", probe()));
    }

    #[test]
    fn send_to_closed_connection_reports_failure() {
        let mut registry = ConnectionRegistry::new();
        let (driver, driver_rx) = open_handle();
        registry.register_driver("d-1", driver);
        drop(driver_rx);

        assert!(!registry.is_driver_connected("d-1"));
        assert!(!registry.send_to_client("d-1", probe()));
    }

    #[test]
    fn observer_registration_replaces_previous() {
        let mut registry = ConnectionRegistry::new();
        let (first, mut first_rx) = open_handle();
        let (second, mut second_rx) = open_handle();
        registry.register_observer(first);
        registry.register_observer(second);

        assert!(registry.send_to_observer(probe()));
        assert!(first_rx.try_recv().is_err());
        assert!(second_rx.try_recv().is_ok());
    }

    #[test]
    fn unregister_matches_connection_id_not_client_id() {
        let mut registry = ConnectionRegistry::new();
        let (old, _old_rx) = open_handle();
        let old_conn = old.conn_id;
        registry.register_driver("d-1", old);

        // d-1 reconnects; the new binding replaces the old one.
        let (new, mut new_rx) = open_handle();
        registry.register_driver("d-1", new);

        // The stale connection's close must not evict the replacement.
        registry.unregister(old_conn);
        assert!(registry.is_driver_connected("d-1"));
        assert!(registry.send_to_client("d-1", probe()));
        assert!(new_rx.try_recv().is_ok());
    }

    #[test]
    fn unregister_clears_observer_slot() {
        let mut registry = ConnectionRegistry::new();
        let (observer, _rx) = open_handle();
        let conn_id = observer.conn_id;
        registry.register_observer(observer);

        registry.unregister(conn_id);
        assert!(registry.observer().is_none());
        assert!(!registry.send_to_observer(probe()));
    }

    #[test]
    fn broadcast_excludes_one_connection() {
        let mut registry = ConnectionRegistry::new();
        let (driver, mut driver_rx) = open_handle();
        let (user, mut user_rx) = open_handle();
        let (observer, mut observer_rx) = open_handle();
        let excluded = user.conn_id;
        registry.register_driver("d-1", driver);
        registry.register_user("u-1", user);
        registry.register_observer(observer);

        let delivered = registry.broadcast_to_all(&probe(), Some(excluded));
        assert_eq!(delivered, 2);
        assert!(driver_rx.try_recv().is_ok());
        assert!(user_rx.try_recv().is_err());
        assert!(observer_rx.try_recv().is_ok());
    }

    #[test]
    fn counts_track_registrations() {
        let mut registry = ConnectionRegistry::new();
        let (d1, _d1_rx) = open_handle();
        let (d2, _d2_rx) = open_handle();
        let (u1, _u1_rx) = open_handle();
        registry.register_driver("d-1", d1);
        registry.register_driver("d-2", d2);
        registry.register_user("u-1", u1);

        let counts = registry.counts();
        assert_eq!(counts.drivers_count, 2);
        assert_eq!(counts.users_count, 1);
    }
}
