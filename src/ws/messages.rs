//! Wire protocol: inbound and outbound message unions.
//!
//! Frames are JSON objects with a snake_case `type` discriminator and
//! camelCase payload fields. Inbound frames deserialize into
//! [`ClientMessage`]; the dispatcher matches exhaustively, so adding a
//! message kind is a compile-time exercise. [`ClientMessage::parse`]
//! distinguishes an unrecognized `type` from a structurally malformed
//! frame so each gets its own error reply.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::profile::{DriverProfile, GeoPoint, Place, RiderSummary, UserProfile, Vehicle};
use crate::domain::{PoolSnapshot, RideId, RideStatus};
use crate::error::MatcherError;

/// The `type` tags this server understands, in protocol order.
const KNOWN_CLIENT_TYPES: [&str; 6] = [
    "driver_register",
    "user_register",
    "matcher_register",
    "driver_status",
    "match_request",
    "booking_response",
];

/// A user's answer to a `booking_request`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingDecision {
    /// Take the ride.
    Accept,
    /// Decline the ride.
    Reject,
    /// Ask to be nudged again later.
    Remind,
}

/// Inbound client frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Register this connection as a driver.
    DriverRegister {
        /// Driver id to bind; must exist in the profile directory.
        driver_id: String,
    },
    /// Register this connection as a user.
    UserRegister {
        /// User id to bind; must exist in the profile directory.
        user_id: String,
    },
    /// Register this connection as the single observer.
    MatcherRegister,
    /// Driver availability update; acts on the registered driver's own id.
    DriverStatus {
        /// New availability. `false` removes the driver from the pool.
        is_available: bool,
        /// Optional position refresh.
        #[serde(default)]
        location: Option<GeoPoint>,
    },
    /// Manual match request (observer only).
    MatchRequest {
        /// Waiting user to pair.
        user_id: String,
        /// Available driver to pair.
        driver_id: String,
    },
    /// A user's response to a booking proposal.
    BookingResponse {
        /// The proposed ride.
        ride_id: RideId,
        /// Accept, reject, or remind.
        response: BookingDecision,
    },
}

impl ClientMessage {
    /// Parses one inbound text frame.
    ///
    /// # Errors
    ///
    /// - [`MatcherError::MalformedMessage`] when the frame is not JSON, or
    ///   carries a known `type` with a bad payload.
    /// - [`MatcherError::UnknownMessageType`] when the `type` tag is not
    ///   one this server understands.
    pub fn parse(text: &str) -> Result<Self, MatcherError> {
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| MatcherError::MalformedMessage(e.to_string()))?;
        match serde_json::from_value::<Self>(value.clone()) {
            Ok(message) => Ok(message),
            Err(err) => match value.get("type").and_then(serde_json::Value::as_str) {
                Some(kind) if !KNOWN_CLIENT_TYPES.contains(&kind) => {
                    Err(MatcherError::UnknownMessageType(kind.to_string()))
                }
                _ => Err(MatcherError::MalformedMessage(err.to_string())),
            },
        }
    }
}

/// Driver/user connection counts included in acks and pool updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolCounts {
    /// Currently registered driver connections.
    pub drivers_count: usize,
    /// Currently registered user connections.
    pub users_count: usize,
}

/// Settled-match details attached to the observer's `pool_update`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchInfo {
    /// The ride that settled.
    pub ride_id: RideId,
    /// Its new status.
    pub status: RideStatus,
    /// The matched user id.
    pub user: String,
    /// The matched driver id.
    pub driver: String,
}

/// Outbound server frame.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Greeting pushed to every accepted connection.
    ConnectionEstablished {
        /// Human-readable welcome.
        message: String,
        /// Opaque id assigned to this connection.
        connection_id: Uuid,
    },
    /// Successful driver/user registration ack.
    RegistrationSuccess {
        /// Human-readable confirmation.
        message: String,
        /// Connection counts at registration time.
        pool: PoolCounts,
    },
    /// Error reply to the offending connection.
    Error {
        /// What went wrong.
        message: String,
    },
    /// Full pool snapshot pushed to the observer.
    PoolUpdate {
        /// Drivers currently available for matching.
        available_drivers: Vec<DriverProfile>,
        /// Users currently waiting for a match.
        available_users: Vec<UserProfile>,
        /// Connection counts.
        connections: PoolCounts,
        /// Present when the push follows a settled match.
        #[serde(skip_serializing_if = "Option::is_none")]
        match_info: Option<MatchInfo>,
    },
    /// Result of a `match_request`, returned to the observer.
    MatchResult {
        /// Whether a proposal was delivered.
        success: bool,
        /// Failure reason or confirmation text.
        message: String,
        /// Ledger id of the proposal, on success.
        #[serde(skip_serializing_if = "Option::is_none")]
        ride_id: Option<RideId>,
    },
    /// Booking proposal delivered to the targeted user.
    BookingRequest {
        /// Ledger id the user must echo back.
        ride_id: RideId,
        /// Proposed driver's id.
        driver_id: String,
        /// Proposed driver's name.
        driver_name: String,
        /// Proposed driver's rating.
        driver_rating: f64,
        /// Proposed driver's vehicle.
        vehicle_details: Vehicle,
        /// Estimated minutes until pickup.
        estimated_arrival: u32,
        /// Fare estimate from the user's own request.
        estimated_fare: u32,
        /// Requested pickup time.
        pickup_time: String,
        /// Pickup address.
        pickup: String,
        /// Destination address.
        destination: String,
    },
    /// Confirmation delivered to the driver after the user accepts.
    RideAccepted {
        /// The accepted ride.
        ride_id: RideId,
        /// Rider's public profile.
        user: RiderSummary,
        /// Pickup location.
        pickup: Place,
        /// Drop location.
        destination: Place,
        /// Fare estimate.
        estimated_fare: u32,
        /// When the acceptance was processed.
        timestamp: DateTime<Utc>,
    },
    /// Rejection notice delivered to the observer.
    MatchRejected {
        /// The rejected ride.
        ride_id: RideId,
        /// The rejecting user's id.
        user_id: String,
        /// The freed driver's id.
        driver_id: String,
        /// Pool contents after the driver's return.
        active_pool: PoolSnapshot,
    },
    /// Deferred nudge delivered to the user after a `remind`.
    BookingReminder {
        /// The ride awaiting a decision.
        ride_id: RideId,
        /// Proposed driver's id.
        driver_id: String,
        /// Proposed driver's name.
        driver_name: String,
        /// Requested pickup time.
        pickup_time: String,
    },
    /// Ack for a `driver_status` update.
    StatusUpdated {
        /// `available` or `unavailable`.
        status: String,
    },
    /// Ack for a processed `booking_response`.
    BookingProcessed {
        /// The ride that was acted on.
        ride_id: RideId,
        /// Status after processing.
        status: RideStatus,
    },
}
