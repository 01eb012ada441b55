//! Shared matcher state.
//!
//! The connection registry, active pool, and ride ledger are the only
//! shared mutable resources in the process. They are owned as one value,
//! constructed once at startup and injected into the dispatcher, which
//! serializes every mutation behind a single lock.

use crate::ws::messages::{MatchInfo, ServerMessage};

use super::active_pool::ActivePool;
use super::registry::ConnectionRegistry;
use super::ride_ledger::RideLedger;

/// The three shared registries, mutated only under the dispatcher's lock.
#[derive(Debug, Default)]
pub struct MatcherState {
    /// Live connections by role.
    pub registry: ConnectionRegistry,
    /// Available drivers and waiting users.
    pub pool: ActivePool,
    /// All pairing attempts seen this session.
    pub ledger: RideLedger,
}

impl MatcherState {
    /// Creates empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a `pool_update` frame from the current pool and connection
    /// counts.
    #[must_use]
    pub fn pool_update(&self, match_info: Option<MatchInfo>) -> ServerMessage {
        let snapshot = self.pool.snapshot();
        ServerMessage::PoolUpdate {
            available_drivers: snapshot.available_drivers,
            available_users: snapshot.available_users,
            connections: self.registry.counts(),
            match_info,
        }
    }

    /// Pushes a fresh pool snapshot to the observer, if one is registered.
    ///
    /// Each push is a full snapshot, so a missed intermediate push is
    /// harmless.
    pub fn push_pool_to_observer(&self, match_info: Option<MatchInfo>) {
        if self.registry.observer().is_some() {
            let update = self.pool_update(match_info);
            if !self.registry.send_to_observer(update) {
                tracing::debug!("observer pool push skipped: connection closed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::directory::ProfileDirectory;
    use crate::domain::registry::ClientHandle;
    use tokio::sync::mpsc;
    use uuid::Uuid;

    #[test]
    fn pool_update_reflects_pool_and_counts() {
        let mut state = MatcherState::new();
        let directory = ProfileDirectory::sample();
        if let Some(driver) = directory.driver("d-10234") {
            state.pool.add_driver(driver.clone());
        }
        let (tx, _rx) = mpsc::unbounded_channel();
        state
            .registry
            .register_driver("d-10234", ClientHandle::new(Uuid::new_v4(), tx));

        let ServerMessage::PoolUpdate {
            available_drivers,
            available_users,
            connections,
            match_info,
        } = state.pool_update(None)
        else {
            unreachable!("pool_update builds a PoolUpdate");
        };
        assert_eq!(available_drivers.len(), 1);
        assert!(available_users.is_empty());
        assert_eq!(connections.drivers_count, 1);
        assert_eq!(connections.users_count, 0);
        assert!(match_info.is_none());
    }

    #[test]
    fn observer_push_without_observer_is_noop() {
        let state = MatcherState::new();
        // Must not panic or send anywhere.
        state.push_pool_to_observer(None);
    }

    #[test]
    fn observer_push_delivers_snapshot() {
        let mut state = MatcherState::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        state
            .registry
            .register_observer(ClientHandle::new(Uuid::new_v4(), tx));

        state.push_pool_to_observer(None);
        assert!(matches!(
            rx.try_recv(),
            Ok(ServerMessage::PoolUpdate { .. })
        ));
    }
}
