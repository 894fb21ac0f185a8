//! Background price updater
//!
//! Polls the upstream client on a fixed interval with the currently selected
//! crypto code and broadcasts every resolved price to WebSocket subscribers.
//! Iteration failures are logged and swallowed; the loop only exits on
//! shutdown, which also interrupts an in-progress sleep.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::server::PriceBroadcaster;
use crate::settings::SettingsStore;
use crate::upstream::QuoteClient;

pub async fn run(
    settings: Arc<SettingsStore>,
    quotes: Arc<dyn QuoteClient>,
    broadcaster: PriceBroadcaster,
    interval: Duration,
    currencies: Vec<String>,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::info!(interval_secs = interval.as_secs(), "Background price updater starting");

    loop {
        if *shutdown.borrow() {
            break;
        }

        let crypto_code = settings.get().await;
        match quotes.get_prices(&crypto_code, &currencies).await {
            Ok(prices) => {
                let mut pushed = 0usize;
                for price in &prices {
                    if let Some(value) = price.price {
                        broadcaster.broadcast_price(&crypto_code, &price.currency, value);
                        pushed += 1;
                    }
                }
                tracing::info!(
                    crypto_code = %crypto_code,
                    pushed,
                    "Pushed cryptocurrency prices to subscribers"
                );
            }
            Err(e) => {
                tracing::warn!(
                    crypto_code = %crypto_code,
                    error = %e,
                    "Price update iteration failed"
                );
            }
        }

        // Only a genuine shutdown interrupts the sleep; other watch
        // notifications keep the loop on schedule. A closed channel counts
        // as shutdown.
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.wait_for(|stop| *stop) => break,
        }
    }

    tracing::info!("Background price updater stopped");
}
