//! Service layer: the matching engine.
//!
//! [`MatchService`] validates pairing preconditions against the shared
//! state and delivers booking proposals; the protocol dispatcher
//! orchestrates everything else.

pub mod match_service;

pub use match_service::{ArrivalEstimator, MatchService, UniformArrival};
