//! Matching engine: validates a proposed pairing and delivers the booking
//! proposal.

use std::sync::Arc;

use crate::domain::profile::{DriverProfile, RideRequest};
use crate::domain::{MatcherState, RideId};
use crate::error::MatcherError;
use crate::ws::messages::ServerMessage;

/// Pickup-arrival estimator seam.
///
/// The demo ships a uniform random stand-in; a real implementation would
/// derive the estimate from distance and traffic without touching the
/// protocol.
pub trait ArrivalEstimator: std::fmt::Debug + Send + Sync {
    /// Estimated minutes until the driver reaches the pickup point.
    fn estimate_minutes(&self, driver: &DriverProfile, request: &RideRequest) -> u32;
}

/// Uniformly random arrival estimate within an inclusive bound.
#[derive(Debug, Clone, Copy)]
pub struct UniformArrival {
    min: u32,
    max: u32,
}

impl UniformArrival {
    /// Creates an estimator producing values in `min..=max`.
    #[must_use]
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

impl Default for UniformArrival {
    /// The demo's 3–8 minute window.
    fn default() -> Self {
        Self::new(3, 8)
    }
}

impl ArrivalEstimator for UniformArrival {
    fn estimate_minutes(&self, _driver: &DriverProfile, _request: &RideRequest) -> u32 {
        if self.min >= self.max {
            return self.min;
        }
        fastrand::u32(self.min..=self.max)
    }
}

/// Names the failing side(s) for a precondition error message.
fn describe_sides(user_id: &str, user_ok: bool, driver_id: &str, driver_ok: bool) -> String {
    match (user_ok, driver_ok) {
        (false, false) => format!("user {user_id} and driver {driver_id}"),
        (false, true) => format!("user {user_id}"),
        _ => format!("driver {driver_id}"),
    }
}

/// The matching engine.
///
/// `propose` validates preconditions, creates the ledger entry, and pushes
/// a `booking_request` to the user. It never mutates the active pool: both
/// parties stay visible to concurrent match attempts until the user
/// accepts, so two observers can propose the same driver to two users
/// before either answers. That window is a known limitation of this demo
/// protocol, kept as-is.
#[derive(Debug, Clone)]
pub struct MatchService {
    estimator: Arc<dyn ArrivalEstimator>,
}

impl MatchService {
    /// Creates a matching engine with the given arrival estimator.
    #[must_use]
    pub fn new(estimator: Arc<dyn ArrivalEstimator>) -> Self {
        Self { estimator }
    }

    /// Pairs `user_id` with `driver_id`.
    ///
    /// Preconditions are checked in order: both ids must be members of the
    /// active pool, then both must have an open registered connection.
    /// Membership and liveness can diverge, so both checks are required.
    /// On success a `pending` ledger entry exists and the user has been
    /// sent a `booking_request`.
    ///
    /// # Errors
    ///
    /// - [`MatcherError::NotInPool`] naming the missing side(s).
    /// - [`MatcherError::NotConnected`] naming the disconnected side(s).
    ///
    /// No ledger entry is created on failure.
    pub fn propose(
        &self,
        state: &mut MatcherState,
        user_id: &str,
        driver_id: &str,
    ) -> Result<RideId, MatcherError> {
        let user_in_pool = state.pool.contains_user(user_id);
        let driver_in_pool = state.pool.contains_driver(driver_id);
        if !user_in_pool || !driver_in_pool {
            return Err(MatcherError::NotInPool(describe_sides(
                user_id,
                user_in_pool,
                driver_id,
                driver_in_pool,
            )));
        }

        let user_connected = state.registry.is_user_connected(user_id);
        let driver_connected = state.registry.is_driver_connected(driver_id);
        if !user_connected || !driver_connected {
            return Err(MatcherError::NotConnected(describe_sides(
                user_id,
                user_connected,
                driver_id,
                driver_connected,
            )));
        }

        let (user, driver) = match (state.pool.user(user_id), state.pool.driver(driver_id)) {
            (Some(u), Some(d)) => (u.clone(), d.clone()),
            _ => {
                return Err(MatcherError::NotInPool(describe_sides(
                    user_id,
                    state.pool.contains_user(user_id),
                    driver_id,
                    state.pool.contains_driver(driver_id),
                )));
            }
        };

        let estimated_arrival = self.estimator.estimate_minutes(&driver, &user.ride_request);
        let ride_id = state.ledger.create(user.clone(), driver.clone());
        tracing::info!(%ride_id, user_id, driver_id, "match proposed");

        let request = &user.ride_request;
        let delivered = state.registry.send_to_client(
            user_id,
            ServerMessage::BookingRequest {
                ride_id,
                driver_id: driver.id.clone(),
                driver_name: driver.name.clone(),
                driver_rating: driver.rating,
                vehicle_details: driver.vehicle.clone(),
                estimated_arrival,
                estimated_fare: request.estimated_fare,
                pickup_time: request.scheduled_time.clone(),
                pickup: request.pickup_location.address.clone(),
                destination: request.drop_location.address.clone(),
            },
        );
        if !delivered {
            tracing::warn!(%ride_id, user_id, "booking request not delivered");
        }

        Ok(ride_id)
    }
}
