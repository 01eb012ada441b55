//! Ride ledger: in-flight and settled pairing attempts.
//!
//! Every successful match creates a ledger entry; entries are retained for
//! the life of the process so that duplicate or late booking responses can
//! be detected and replayed idempotently instead of erroring.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::profile::{DriverProfile, Place, UserProfile};
use super::ride_id::RideId;
use crate::error::MatcherError;

/// Booking state machine for one ride.
///
/// `pending` is initial. `accepted` and `rejected` are terminal for
/// pool-membership purposes; `remind` is not terminal and a later
/// accept/reject still applies normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RideStatus {
    /// Proposal delivered, no response yet.
    Pending,
    /// The user accepted the booking.
    Accepted,
    /// The user rejected the booking.
    Rejected,
    /// The user asked to be reminded later.
    Remind,
}

impl RideStatus {
    /// `true` for states that end the booking handshake.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }

    /// Wire string for this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Remind => "remind",
        }
    }
}

/// One proposed or confirmed driver-user pairing.
///
/// Embeds snapshots of both profiles as they stood at match time, plus the
/// trip parameters copied from the user's ride request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ride {
    /// Ledger key.
    pub id: RideId,
    /// Rider snapshot at match time.
    pub user: UserProfile,
    /// Driver snapshot at match time.
    pub driver: DriverProfile,
    /// Current booking state.
    pub status: RideStatus,
    /// When the proposal was created.
    pub request_time: DateTime<Utc>,
    /// Pickup location copied from the ride request.
    pub pickup_location: Place,
    /// Drop location copied from the ride request.
    pub drop_location: Place,
    /// Fare estimate copied from the ride request.
    pub estimated_fare: u32,
    /// Distance estimate in kilometers.
    pub estimated_distance: f64,
    /// Trip time estimate in minutes.
    pub estimated_time: u32,
    /// Requested pickup time (`HH:MM`).
    pub scheduled_time: String,
}

/// Map of all pairing attempts seen this session, keyed by ride id.
///
/// Entries are never deleted; `ride not found` is impossible for an id the
/// ledger handed out.
#[derive(Debug, Default)]
pub struct RideLedger {
    rides: HashMap<RideId, Ride>,
}

impl RideLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a new ride id and stores a `pending` entry built from the
    /// matched pair, copying trip parameters out of the user's request.
    pub fn create(&mut self, user: UserProfile, driver: DriverProfile) -> RideId {
        let id = RideId::new();
        let request = &user.ride_request;
        let ride = Ride {
            id,
            status: RideStatus::Pending,
            request_time: Utc::now(),
            pickup_location: request.pickup_location.clone(),
            drop_location: request.drop_location.clone(),
            estimated_fare: request.estimated_fare,
            estimated_distance: request.estimated_distance,
            estimated_time: request.estimated_time,
            scheduled_time: request.scheduled_time.clone(),
            user,
            driver,
        };
        self.rides.insert(id, ride);
        id
    }

    /// Looks up a ride by id.
    #[must_use]
    pub fn get(&self, id: RideId) -> Option<&Ride> {
        self.rides.get(&id)
    }

    /// Applies a status transition.
    ///
    /// Pool-membership side effects are orchestrated by the caller, never
    /// here.
    ///
    /// # Errors
    ///
    /// Returns [`MatcherError::RideNotFound`] if the id is unknown.
    pub fn transition(&mut self, id: RideId, status: RideStatus) -> Result<&Ride, MatcherError> {
        let ride = self
            .rides
            .get_mut(&id)
            .ok_or(MatcherError::RideNotFound(id))?;
        ride.status = status;
        Ok(ride)
    }

    /// Number of ledger entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rides.len()
    }

    /// `true` if no pairing has been attempted yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rides.is_empty()
    }
}
