//! WebSocket layer: connection handling, protocol dispatch, wire messages.
//!
//! The WebSocket endpoint at `/ws` carries the whole matching protocol:
//! role registration, availability updates, match requests, and the
//! booking handshake.

pub mod connection;
pub mod dispatcher;
pub mod handler;
pub mod messages;

pub use dispatcher::{ClientIdentity, ClientSession, Dispatcher};
pub use messages::{ClientMessage, ServerMessage};
