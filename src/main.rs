//! crypto-quote-api entry point

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use crypto_quote_api::config::AppConfig;
use crypto_quote_api::server::{create_router, AppState, PriceBroadcaster};
use crypto_quote_api::settings::SettingsStore;
use crypto_quote_api::types::normalize_currencies;
use crypto_quote_api::updater;
use crypto_quote_api::upstream::{CoinMarketCapClient, QuoteClient};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    tracing::info!(config = %config.digest(), "Starting crypto-quote-api");

    let settings = Arc::new(SettingsStore::new());
    let quotes: Arc<dyn QuoteClient> = Arc::new(CoinMarketCapClient::new(
        &config.coinmarketcap.base_url,
        &config.coinmarketcap.api_key,
    )?);
    let broadcaster = PriceBroadcaster::new(100);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let updater_handle = if config.updater.enabled {
        Some(tokio::spawn(updater::run(
            Arc::clone(&settings),
            Arc::clone(&quotes),
            broadcaster.clone(),
            Duration::from_secs(config.updater.interval_secs),
            normalize_currencies(&config.updater.currencies),
            shutdown_rx,
        )))
    } else {
        None
    };

    let app = create_router(AppState::new(settings, quotes, broadcaster));
    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port))
            .await
            .with_context(|| {
                format!("Failed to bind {}:{}", config.server.host, config.server.port)
            })?;
    tracing::info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await
        .context("Server error")?;

    let _ = shutdown_tx.send(true);
    if let Some(handle) = updater_handle {
        let _ = handle.await;
    }

    Ok(())
}
