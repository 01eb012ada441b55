//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::ws::Dispatcher;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Protocol dispatcher owning the matcher's shared state.
    pub dispatcher: Arc<Dispatcher>,
}
