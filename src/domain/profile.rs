//! Driver and rider profile records.
//!
//! These are the data shapes supplied by the external profile directory and
//! copied into the active pool; the matcher reads and forwards them but
//! never computes them. Serde renames keep the original camelCase wire
//! shapes.

use serde::{Deserialize, Serialize};

/// A bare latitude/longitude coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lng: f64,
}

/// A named location: coordinates plus a human-readable address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lng: f64,
    /// Street address shown to riders and drivers.
    pub address: String,
}

/// Vehicle descriptor attached to a driver profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Vehicle make and model.
    pub model: String,
    /// Registration plate number.
    pub number: String,
    /// Body color.
    pub color: String,
    /// Vehicle class (e.g. `Hatchback`, `Sedan`).
    #[serde(rename = "type")]
    pub kind: String,
}

/// A driver's rolling daily statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    /// Earnings for the current day.
    pub earnings: u32,
    /// Rides completed today.
    pub completed_rides: u32,
    /// Rides declined today.
    pub declined_rides: u32,
    /// Acceptance rate in percent.
    pub acceptance_rate: u32,
    /// Hours online today.
    pub online_hours: f64,
}

/// A driver's profile and live state as held in the active pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverProfile {
    /// Stable driver id, independent of any connection.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Aggregate rider rating.
    pub rating: f64,
    /// Vehicle descriptor.
    pub vehicle: Vehicle,
    /// Last reported position.
    pub current_location: GeoPoint,
    /// Whether the driver is accepting rides. Pool entries always carry
    /// `true`; absence from the pool encodes unavailability.
    pub available_for_rides: bool,
    /// Lifetime completed rides.
    pub completed_rides: u32,
    /// Lifetime earnings.
    pub total_earnings: u64,
    /// Rolling daily statistics.
    pub daily_stats: DailyStats,
}

/// A rider's single pending ride request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideRequest {
    /// Where the rider wants to be picked up.
    pub pickup_location: Place,
    /// Where the rider wants to go.
    pub drop_location: Place,
    /// Requested pickup time (`HH:MM`).
    pub scheduled_time: String,
    /// Fare estimate supplied with the request.
    pub estimated_fare: u32,
    /// Distance estimate in kilometers.
    pub estimated_distance: f64,
    /// Trip time estimate in minutes.
    pub estimated_time: u32,
    /// Preferred vehicle class, `any` for no preference.
    pub vehicle_type: String,
    /// Preferred payment method.
    pub payment_method: String,
}

/// A rider's profile, carrying exactly one pending [`RideRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Stable user id, independent of any connection.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Aggregate driver rating of this rider.
    pub rating: f64,
    /// The pending ride request.
    pub ride_request: RideRequest,
}

/// The rider fields shared with a driver in `ride_accepted` frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiderSummary {
    /// Stable user id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Aggregate rating.
    pub rating: f64,
}

impl From<&UserProfile> for RiderSummary {
    fn from(user: &UserProfile) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            rating: user.rating,
        }
    }
}
