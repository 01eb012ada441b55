//! Read-only directory of driver and user profile templates.
//!
//! The directory is the matcher's external collaborator: registrations are
//! validated against it and pool entries are cloned from it. It is loaded
//! once at startup (from a JSON seed file or the built-in samples) and
//! never mutated.

use std::collections::HashMap;
use std::path::Path;

use super::profile::{
    DailyStats, DriverProfile, GeoPoint, Place, RideRequest, UserProfile, Vehicle,
};

/// JSON seed file shape: `{ "drivers": [...], "users": [...] }`.
#[derive(Debug, serde::Deserialize)]
struct SeedFile {
    drivers: Vec<DriverProfile>,
    users: Vec<UserProfile>,
}

/// Immutable template lookup over driver and user profiles, keyed by id.
#[derive(Debug)]
pub struct ProfileDirectory {
    drivers: HashMap<String, DriverProfile>,
    users: HashMap<String, UserProfile>,
}

impl ProfileDirectory {
    /// Builds a directory from explicit template collections.
    #[must_use]
    pub fn new(
        drivers: impl IntoIterator<Item = DriverProfile>,
        users: impl IntoIterator<Item = UserProfile>,
    ) -> Self {
        Self {
            drivers: drivers.into_iter().map(|d| (d.id.clone(), d)).collect(),
            users: users.into_iter().map(|u| (u.id.clone(), u)).collect(),
        }
    }

    /// Loads a directory from a JSON seed file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not parse as a
    /// [`SeedFile`]-shaped document.
    pub fn from_json_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let raw = std::fs::read_to_string(path)?;
        let seed: SeedFile = serde_json::from_str(&raw)?;
        Ok(Self::new(seed.drivers, seed.users))
    }

    /// Looks up a driver template by id.
    #[must_use]
    pub fn driver(&self, id: &str) -> Option<&DriverProfile> {
        self.drivers.get(id)
    }

    /// Looks up a user template by id.
    #[must_use]
    pub fn user(&self, id: &str) -> Option<&UserProfile> {
        self.users.get(id)
    }

    /// Returns the number of driver templates.
    #[must_use]
    pub fn driver_count(&self) -> usize {
        self.drivers.len()
    }

    /// Returns the number of user templates.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Built-in demo profiles: two drivers and two riders around Bengaluru,
    /// each rider carrying one pending ride request.
    #[must_use]
    pub fn sample() -> Self {
        let drivers = vec![
            DriverProfile {
                id: "d-10234".to_string(),
                name: "Rajesh Kumar".to_string(),
                rating: 4.8,
                vehicle: Vehicle {
                    model: "Maruti Suzuki Swift".to_string(),
                    number: "KA 01 AB 1234".to_string(),
                    color: "White".to_string(),
                    kind: "Hatchback".to_string(),
                },
                current_location: GeoPoint {
                    lat: 12.9716,
                    lng: 77.5946,
                },
                available_for_rides: true,
                completed_rides: 1247,
                total_earnings: 245_800,
                daily_stats: DailyStats {
                    earnings: 1250,
                    completed_rides: 8,
                    declined_rides: 2,
                    acceptance_rate: 80,
                    online_hours: 7.5,
                },
            },
            DriverProfile {
                id: "d-10235".to_string(),
                name: "Priya Singh".to_string(),
                rating: 4.9,
                vehicle: Vehicle {
                    model: "Honda City".to_string(),
                    number: "KA 05 MJ 5678".to_string(),
                    color: "Silver".to_string(),
                    kind: "Sedan".to_string(),
                },
                current_location: GeoPoint {
                    lat: 12.9782,
                    lng: 77.6408,
                },
                available_for_rides: true,
                completed_rides: 2135,
                total_earnings: 392_600,
                daily_stats: DailyStats {
                    earnings: 890,
                    completed_rides: 6,
                    declined_rides: 1,
                    acceptance_rate: 86,
                    online_hours: 5.2,
                },
            },
        ];

        let users = vec![
            UserProfile {
                id: "u-20456".to_string(),
                name: "Amit Patel".to_string(),
                rating: 4.7,
                ride_request: RideRequest {
                    pickup_location: Place {
                        lat: 12.9716,
                        lng: 77.5946,
                        address: "Cubbon Park, Bengaluru".to_string(),
                    },
                    drop_location: Place {
                        lat: 12.9780,
                        lng: 77.7575,
                        address: "Whitefield Tech Park, Bengaluru".to_string(),
                    },
                    scheduled_time: "18:30".to_string(),
                    estimated_fare: 350,
                    estimated_distance: 12.4,
                    estimated_time: 45,
                    vehicle_type: "any".to_string(),
                    payment_method: "card".to_string(),
                },
            },
            UserProfile {
                id: "u-20457".to_string(),
                name: "Meera Sharma".to_string(),
                rating: 4.9,
                ride_request: RideRequest {
                    pickup_location: Place {
                        lat: 12.9782,
                        lng: 77.6408,
                        address: "Indiranagar, Bengaluru".to_string(),
                    },
                    drop_location: Place {
                        lat: 12.9150,
                        lng: 77.6500,
                        address: "Koramangala Tech Hub, Bengaluru".to_string(),
                    },
                    scheduled_time: "18:30".to_string(),
                    estimated_fare: 220,
                    estimated_distance: 7.8,
                    estimated_time: 25,
                    vehicle_type: "hatchback".to_string(),
                    payment_method: "upi".to_string(),
                },
            },
        ];

        Self::new(drivers, users)
    }
}
