//! Active pool of available drivers and waiting users.
//!
//! Membership encodes availability: a driver who is unavailable is absent
//! from the pool, not present with a cleared flag. The matching engine only
//! ever scans membership, and pool snapshots pushed to the observer are
//! complete dumps, so a quick availability toggle is a full remove and
//! recreate. All operations are idempotent set-like mutations; callers
//! validate existence before mutating when an error must reach a client.

use serde::Serialize;

use super::profile::{DriverProfile, GeoPoint, UserProfile};

/// Point-in-time dump of the active pool.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolSnapshot {
    /// Drivers currently available for matching, in insertion order.
    pub available_drivers: Vec<DriverProfile>,
    /// Users currently waiting for a match, in insertion order.
    pub available_users: Vec<UserProfile>,
}

/// In-memory sets of currently available drivers and waiting users.
///
/// A given driver or user id appears at most once.
#[derive(Debug, Default)]
pub struct ActivePool {
    drivers: Vec<DriverProfile>,
    users: Vec<UserProfile>,
}

impl ActivePool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a driver record, unless one with the same id is already
    /// present. Returns `true` if the record was inserted.
    pub fn add_driver(&mut self, record: DriverProfile) -> bool {
        if self.contains_driver(&record.id) {
            return false;
        }
        self.drivers.push(record);
        true
    }

    /// Removes a driver by id, returning the record. Absent ids are a
    /// no-op.
    pub fn remove_driver(&mut self, id: &str) -> Option<DriverProfile> {
        let idx = self.drivers.iter().position(|d| d.id == id)?;
        Some(self.drivers.remove(idx))
    }

    /// Adds a user record, unless one with the same id is already present.
    /// Returns `true` if the record was inserted.
    pub fn add_user(&mut self, record: UserProfile) -> bool {
        if self.contains_user(&record.id) {
            return false;
        }
        self.users.push(record);
        true
    }

    /// Removes a user by id, returning the record. Absent ids are a no-op.
    pub fn remove_user(&mut self, id: &str) -> Option<UserProfile> {
        let idx = self.users.iter().position(|u| u.id == id)?;
        Some(self.users.remove(idx))
    }

    /// `true` if a driver with this id is in the pool.
    #[must_use]
    pub fn contains_driver(&self, id: &str) -> bool {
        self.drivers.iter().any(|d| d.id == id)
    }

    /// `true` if a user with this id is in the pool.
    #[must_use]
    pub fn contains_user(&self, id: &str) -> bool {
        self.users.iter().any(|u| u.id == id)
    }

    /// Returns the pooled driver record for `id`.
    #[must_use]
    pub fn driver(&self, id: &str) -> Option<&DriverProfile> {
        self.drivers.iter().find(|d| d.id == id)
    }

    /// Returns the pooled user record for `id`.
    #[must_use]
    pub fn user(&self, id: &str) -> Option<&UserProfile> {
        self.users.iter().find(|u| u.id == id)
    }

    /// Applies a driver availability change.
    ///
    /// When `is_available` is `true`: an existing pool entry gets its flag
    /// set and location refreshed; otherwise a working copy is cloned from
    /// the injected `template` lookup and inserted. When `false`, the
    /// driver is removed from the pool outright.
    ///
    /// Returns `false` only when the driver must be inserted but the
    /// template lookup produced nothing.
    pub fn set_driver_availability<F>(
        &mut self,
        id: &str,
        is_available: bool,
        location: Option<GeoPoint>,
        template: F,
    ) -> bool
    where
        F: FnOnce() -> Option<DriverProfile>,
    {
        if !is_available {
            self.remove_driver(id);
            return true;
        }

        if let Some(existing) = self.drivers.iter_mut().find(|d| d.id == id) {
            existing.available_for_rides = true;
            if let Some(loc) = location {
                existing.current_location = loc;
            }
            return true;
        }

        let Some(mut record) = template() else {
            return false;
        };
        record.available_for_rides = true;
        if let Some(loc) = location {
            record.current_location = loc;
        }
        self.drivers.push(record);
        true
    }

    /// Clones the current pool contents into a [`PoolSnapshot`].
    #[must_use]
    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            available_drivers: self.drivers.clone(),
            available_users: self.users.clone(),
        }
    }

    /// Number of drivers currently in the pool.
    #[must_use]
    pub fn driver_count(&self) -> usize {
        self.drivers.len()
    }

    /// Number of users currently in the pool.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::directory::ProfileDirectory;

    fn sample_driver(id: &str) -> DriverProfile {
        let directory = ProfileDirectory::sample();
        let Some(driver) = directory.driver(id) else {
            panic!("sample driver {id} missing");
        };
        driver.clone()
    }

    fn sample_user(id: &str) -> UserProfile {
        let directory = ProfileDirectory::sample();
        let Some(user) = directory.user(id) else {
            panic!("sample user {id} missing");
        };
        user.clone()
    }

    #[test]
    fn driver_id_appears_at_most_once() {
        let mut pool = ActivePool::new();
        assert!(pool.add_driver(sample_driver("d-10234")));
        assert!(!pool.add_driver(sample_driver("d-10234")));
        assert_eq!(pool.driver_count(), 1);
    }

    #[test]
    fn remove_absent_id_is_noop() {
        let mut pool = ActivePool::new();
        assert!(pool.remove_driver("d-10234").is_none());
        assert!(pool.remove_user("u-20456").is_none());
    }

    #[test]
    fn availability_true_twice_keeps_single_entry() {
        let mut pool = ActivePool::new();
        let directory = ProfileDirectory::sample();
        for _ in 0..2 {
            let ok = pool.set_driver_availability("d-10234", true, None, || {
                directory.driver("d-10234").cloned()
            });
            assert!(ok);
        }
        assert_eq!(pool.driver_count(), 1);
    }

    #[test]
    fn availability_false_removes_from_pool() {
        let mut pool = ActivePool::new();
        pool.add_driver(sample_driver("d-10234"));

        let ok = pool.set_driver_availability("d-10234", false, None, || None);
        assert!(ok);
        assert!(!pool.contains_driver("d-10234"));
    }

    #[test]
    fn availability_updates_location_of_existing_entry() {
        let mut pool = ActivePool::new();
        pool.add_driver(sample_driver("d-10234"));

        let moved = GeoPoint { lat: 13.0, lng: 77.7 };
        pool.set_driver_availability("d-10234", true, Some(moved), || None);
        let Some(driver) = pool.driver("d-10234") else {
            panic!("driver missing after update");
        };
        assert!((driver.current_location.lat - 13.0).abs() < f64::EPSILON);
        assert!(driver.available_for_rides);
    }

    #[test]
    fn availability_insert_without_template_fails() {
        let mut pool = ActivePool::new();
        let ok = pool.set_driver_availability("d-404", true, None, || None);
        assert!(!ok);
        assert_eq!(pool.driver_count(), 0);
    }

    #[test]
    fn snapshot_is_a_full_copy() {
        let mut pool = ActivePool::new();
        pool.add_driver(sample_driver("d-10234"));
        pool.add_user(sample_user("u-20457"));

        let snapshot = pool.snapshot();
        assert_eq!(snapshot.available_drivers.len(), 1);
        assert_eq!(snapshot.available_users.len(), 1);

        pool.remove_driver("d-10234");
        // The snapshot is detached from later mutations.
        assert_eq!(snapshot.available_drivers.len(), 1);
    }
}
