//! Configuration management for the quote API
//!
//! Loads from optional config files + environment variables via .env

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub coinmarketcap: CoinMarketCapConfig,
    pub exchange_rates: ExchangeRatesConfig,
    pub updater: UpdaterConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoinMarketCapConfig {
    /// API base URL
    pub base_url: String,
    /// API key sent as X-CMC_PRO_API_KEY
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeRatesConfig {
    /// API base URL
    pub base_url: String,
    /// access_key query parameter
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdaterConfig {
    /// Enable the background price updater
    pub enabled: bool,
    /// Poll interval in seconds
    pub interval_secs: u64,
    /// Fiat basket broadcast on every poll
    pub currencies: Vec<String>,
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Config::builder()
            // Server defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            // Upstream defaults
            .set_default("coinmarketcap.base_url", "https://pro-api.coinmarketcap.com")?
            .set_default("coinmarketcap.api_key", "")?
            .set_default("exchange_rates.base_url", "https://api.exchangeratesapi.io/v1")?
            .set_default("exchange_rates.api_key", "")?
            // Updater defaults
            .set_default("updater.enabled", true)?
            .set_default("updater.interval_secs", 300)?
            .set_default(
                "updater.currencies",
                vec!["USD", "EUR", "BRL", "GBP", "AUD"],
            )?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (CRYPTOQUOTE_*)
            .add_source(Environment::with_prefix("CRYPTOQUOTE").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        Ok(app_config)
    }

    /// Generate a digest of the config (without secrets) for logging
    pub fn digest(&self) -> String {
        format!(
            "bind={}:{} cmc={} updater_enabled={} interval={}s basket={:?}",
            self.server.host,
            self.server.port,
            self.coinmarketcap.base_url,
            self.updater.enabled,
            self.updater.interval_secs,
            self.updater.currencies,
        )
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
