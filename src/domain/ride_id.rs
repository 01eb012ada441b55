//! Type-safe ride identifier.
//!
//! [`RideId`] wraps a [`uuid::Uuid`] (v4) and renders as `ride-<uuid>` on
//! the wire, the same shape clients echo back in `booking_response` frames.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Unique identifier for a proposed or confirmed ride.
///
/// Generated once when the matching engine creates a ledger entry and
/// immutable thereafter. Used as the ledger key and carried verbatim in
/// `booking_request` / `booking_response` frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RideId(uuid::Uuid);

impl RideId {
    /// Creates a new random `RideId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Creates a `RideId` from an existing [`uuid::Uuid`].
    #[must_use]
    pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner [`uuid::Uuid`].
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for RideId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ride-{}", self.0)
    }
}

impl FromStr for RideId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("ride-").unwrap_or(s);
        Ok(Self(uuid::Uuid::parse_str(raw)?))
    }
}

impl Serialize for RideId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RideId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}
