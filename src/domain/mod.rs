//! Domain layer: profiles, connection registry, active pool, ride ledger.
//!
//! This module contains the server-side domain model: the profile shapes
//! supplied by the external directory, ride identity, the registry of live
//! connections, the active pool whose membership encodes availability, and
//! the ledger of pairing attempts.

pub mod active_pool;
pub mod directory;
pub mod profile;
pub mod registry;
pub mod ride_id;
pub mod ride_ledger;
pub mod state;

pub use active_pool::{ActivePool, PoolSnapshot};
pub use directory::ProfileDirectory;
pub use profile::{DriverProfile, GeoPoint, Place, RideRequest, RiderSummary, UserProfile};
pub use registry::{ClientHandle, ClientSender, ConnectionRegistry};
pub use ride_id::RideId;
pub use ride_ledger::{Ride, RideLedger, RideStatus};
pub use state::MatcherState;
