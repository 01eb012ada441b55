//! Matcher error types.
//!
//! [`MatcherError`] is the central error type for the gateway. Every failure
//! is recovered at the message-handler boundary and converted into an
//! `error` frame (or a failed `match_result`) for the originating
//! connection; nothing propagates far enough to crash the process or drop
//! unrelated clients.

use crate::domain::RideId;

/// Server-side error enum, one variant per failure class.
///
/// | Variant | Reported as |
/// |---------|-------------|
/// | `UnknownDriver` / `UnknownUser` | `error` frame to the registering connection |
/// | `RoleMismatch` / `AlreadyRegistered` | `error` frame to the caller |
/// | `NotInPool` / `NotConnected` | failed `match_result` to the observer |
/// | `RideNotFound` | `error` frame to the responding connection |
/// | `DriverUnreachable` | `error` frame to the accepting user |
/// | `MalformedMessage` / `UnknownMessageType` | `error` frame to the sender |
#[derive(Debug, thiserror::Error)]
pub enum MatcherError {
    /// Driver id is not present in the external profile directory.
    #[error("driver {0} not found in profile directory")]
    UnknownDriver(String),

    /// User id is not present in the external profile directory.
    #[error("user {0} not found in profile directory")]
    UnknownUser(String),

    /// An operation requiring a specific role was invoked by a connection
    /// bound to a different role (or to none).
    #[error("{0}")]
    RoleMismatch(&'static str),

    /// A connection that already holds a role binding attempted to
    /// register under another one.
    #[error("connection is already registered as {0}")]
    AlreadyRegistered(&'static str),

    /// Match precondition: one or both parties are missing from the
    /// active pool. The payload names the missing side(s).
    #[error("match failed: {0} not in active pool")]
    NotInPool(String),

    /// Match precondition: one or both parties have no live registered
    /// connection. The payload names the disconnected side(s).
    #[error("match failed: {0} not connected")]
    NotConnected(String),

    /// A booking response referenced a ride id the ledger has never seen.
    #[error("ride not found: {0}")]
    RideNotFound(RideId),

    /// The matched driver's connection went away between proposal and
    /// acceptance.
    #[error("driver {0} is no longer connected, cannot complete booking")]
    DriverUnreachable(String),

    /// The inbound frame could not be parsed as a known message structure.
    #[error("error processing message: {0}")]
    MalformedMessage(String),

    /// The inbound frame carried an unrecognized `type` discriminator.
    #[error("unknown message type: {0}")]
    UnknownMessageType(String),
}
