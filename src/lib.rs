//! CryptoQuote Library
//!
//! Cryptocurrency quote API with live WebSocket price broadcasting

pub mod config;
pub mod error;
pub mod server;
pub mod settings;
pub mod types;
pub mod updater;
pub mod upstream;
