//! # dispatch-gateway
//!
//! WebSocket matching and session-coordination gateway for a demo
//! ride-hailing application.
//!
//! Drivers, riders, and a single privileged observer (the "matcher")
//! connect to one socket endpoint. The observer pairs waiting riders with
//! available drivers; each proposal walks an accept/reject/remind booking
//! handshake, and the pool state is mirrored to the observer after every
//! pool-affecting event. Everything is in-memory and single-process: the
//! service is a coordination hub for demonstrations, not a production
//! dispatch system.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket: drivers, users, matcher)
//!     │
//!     ├── WS connection loop (ws/connection)
//!     ├── Protocol dispatcher (ws/dispatcher)
//!     │
//!     ├── MatchService (service/)
//!     │
//!     ├── ConnectionRegistry (domain/)
//!     ├── ActivePool (domain/)
//!     ├── RideLedger (domain/)
//!     │
//!     └── ProfileDirectory (external templates, injected)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod ws;
