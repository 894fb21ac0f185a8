//! HTTP/WebSocket surface
//!
//! Routes, quote aggregation, error-to-status mapping, and the broadcast
//! channel consumed by WebSocket clients.

mod api;
mod websocket;

pub use api::create_router;
pub use websocket::{PriceBroadcaster, WsMessage};

use crate::settings::SettingsStore;
use crate::upstream::QuoteClient;
use std::sync::Arc;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<SettingsStore>,
    pub quotes: Arc<dyn QuoteClient>,
    pub broadcaster: PriceBroadcaster,
}

impl AppState {
    pub fn new(
        settings: Arc<SettingsStore>,
        quotes: Arc<dyn QuoteClient>,
        broadcaster: PriceBroadcaster,
    ) -> Self {
        Self {
            settings,
            quotes,
            broadcaster,
        }
    }
}
