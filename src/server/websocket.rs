//! WebSocket price broadcasting
//!
//! Pushes `(cryptoCode, currency, price)` updates to all connected clients.

use axum::extract::ws::{Message, WebSocket};
use serde::Serialize;
use tokio::sync::broadcast;

/// Frames pushed to WebSocket subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WsMessage {
    #[serde(rename_all = "camelCase")]
    CryptoUpdate {
        crypto_code: String,
        currency: String,
        price: f64,
        timestamp: i64,
    },
}

/// Channel for broadcasting price updates to WebSocket clients
#[derive(Debug, Clone)]
pub struct PriceBroadcaster {
    tx: broadcast::Sender<String>,
}

impl PriceBroadcaster {
    /// Create a new broadcaster with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to receive broadcast messages
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    /// Broadcast a message to all connected clients
    pub fn broadcast(&self, msg: &WsMessage) {
        if let Ok(json) = serde_json::to_string(msg) {
            // No receivers is fine
            let _ = self.tx.send(json);
        }
    }

    /// Broadcast a single price update
    pub fn broadcast_price(&self, crypto_code: &str, currency: &str, price: f64) {
        self.broadcast(&WsMessage::CryptoUpdate {
            crypto_code: crypto_code.to_string(),
            currency: currency.to_string(),
            price,
            timestamp: chrono::Utc::now().timestamp_millis(),
        });
    }
}

impl Default for PriceBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Drive one client connection: forward broadcast frames, answer pings.
/// A lagged receiver skips the missed frames and keeps going.
pub(super) async fn handle_socket(socket: WebSocket, broadcaster: PriceBroadcaster) {
    use futures_util::{SinkExt, StreamExt};

    tracing::info!("New WebSocket subscriber");

    let (mut sender, mut receiver) = socket.split();
    let mut rx = broadcaster.subscribe();

    loop {
        tokio::select! {
            update = rx.recv() => {
                match update {
                    Ok(json) => {
                        if sender.send(Message::Text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "WebSocket subscriber lagging, dropped frames");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(error = %e, "WebSocket receive error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    tracing::info!("WebSocket subscriber disconnected");
}
