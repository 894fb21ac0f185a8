//! CoinMarketCap quote client
//!
//! Fans out one request per target currency, bounded by a process-wide
//! semaphore, retries transient transport failures with exponential backoff,
//! and caches fully assembled batches for five minutes.

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use super::QuoteClient;
use crate::error::QuoteError;
use crate::types::PriceResult;

/// Maximum simultaneous upstream calls, shared across all batches.
const GATE_PERMITS: usize = 5;
/// Aggregated batches stay valid this long; expiry is passive.
const CACHE_TTL: Duration = Duration::from_secs(300);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(250);

const API_KEY_HEADER: &str = "X-CMC_PRO_API_KEY";

#[derive(Debug, Clone, Deserialize)]
struct QuotesLatestResponse {
    #[serde(default)]
    data: HashMap<String, CryptoData>,
}

#[derive(Debug, Clone, Deserialize)]
struct CryptoData {
    #[serde(default)]
    quote: HashMap<String, QuoteData>,
}

#[derive(Debug, Clone, Deserialize)]
struct QuoteData {
    price: f64,
}

/// HTTP client for the CoinMarketCap quotes API.
pub struct CoinMarketCapClient {
    client: reqwest::Client,
    base_url: String,
    gate: Arc<Semaphore>,
    cache: Cache<String, Vec<PriceResult>>,
}

impl CoinMarketCapClient {
    /// Create a new client. The API key is sent on every request via the
    /// `X-CMC_PRO_API_KEY` header.
    pub fn new(base_url: &str, api_key: &str) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if !api_key.is_empty() {
            headers.insert(API_KEY_HEADER, HeaderValue::from_str(api_key)?);
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            gate: Arc::new(Semaphore::new(GATE_PERMITS)),
            cache: Cache::builder()
                .time_to_live(CACHE_TTL)
                .max_capacity(1_000)
                .build(),
        })
    }

    /// Fetch the price of `crypto_code` in a single currency. Holds a gate
    /// permit for the duration of the call; the permit is released on every
    /// exit path, including errors and cancellation.
    async fn fetch_price(
        &self,
        crypto_code: &str,
        currency: &str,
    ) -> Result<PriceResult, QuoteError> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| QuoteError::upstream("concurrency gate closed"))?;

        let url = format!(
            "{}/v1/cryptocurrency/quotes/latest?symbol={}&convert={}",
            self.base_url, crypto_code, currency
        );
        tracing::debug!(crypto_code = %crypto_code, currency = %currency, "Requesting quote");

        let response = self.get_with_retry(&url, currency).await?;

        let payload: QuotesLatestResponse = response.json().await.map_err(|e| {
            tracing::error!(currency = %currency, error = %e, "Malformed quote payload");
            QuoteError::upstream("Invalid response format from cryptocurrency service.")
        })?;

        interpret_payload(payload, crypto_code, currency)
    }

    /// Issue the GET, retrying transient failures only: transport errors,
    /// 429 and 5xx. Application-level outcomes are never retried.
    async fn get_with_retry(
        &self,
        url: &str,
        currency: &str,
    ) -> Result<reqwest::Response, QuoteError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.client.get(url).send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    if attempt < MAX_ATTEMPTS && is_retriable_status(status) {
                        tracing::warn!(
                            currency = %currency,
                            status = %status,
                            attempt,
                            "Retriable upstream status, backing off"
                        );
                    } else {
                        tracing::error!(
                            currency = %currency,
                            status = %status,
                            "CoinMarketCap API error"
                        );
                        return Err(QuoteError::upstream(format!(
                            "Failed to retrieve cryptocurrency prices for {currency}. API status: {status}"
                        )));
                    }
                }
                Err(e) => {
                    if attempt < MAX_ATTEMPTS {
                        tracing::warn!(
                            currency = %currency,
                            error = %e,
                            attempt,
                            "Upstream request failed, backing off"
                        );
                    } else {
                        tracing::error!(currency = %currency, error = %e, "Upstream unreachable");
                        return Err(QuoteError::upstream(
                            "Unable to reach the cryptocurrency service.",
                        ));
                    }
                }
            }
            tokio::time::sleep(retry_delay(attempt)).await;
        }
    }
}

#[async_trait]
impl QuoteClient for CoinMarketCapClient {
    async fn get_prices(
        &self,
        crypto_code: &str,
        currencies: &[String],
    ) -> Result<Vec<PriceResult>, QuoteError> {
        let crypto_code = crypto_code.to_uppercase();
        let currencies: Vec<String> = currencies.iter().map(|c| c.to_uppercase()).collect();
        let key = cache_key(&crypto_code, &currencies);

        if let Some(cached) = self.cache.get(&key).await {
            tracing::info!(crypto_code = %crypto_code, "Returning cached cryptocurrency prices");
            return Ok(cached);
        }

        let fetches = currencies
            .iter()
            .map(|currency| self.fetch_price(&crypto_code, currency));
        let outcomes = futures_util::future::join_all(fetches).await;

        // Collect all, then decide: an unknown asset fails the whole batch
        // and outranks transport failures.
        let mut results = Vec::with_capacity(outcomes.len());
        let mut first_transport: Option<QuoteError> = None;
        for outcome in outcomes {
            match outcome {
                Ok(result) => results.push(result),
                Err(err @ QuoteError::CryptocurrencyNotFound(_)) => return Err(err),
                Err(err) => {
                    if first_transport.is_none() {
                        first_transport = Some(err);
                    }
                }
            }
        }
        if let Some(err) = first_transport {
            return Err(err);
        }

        self.cache.insert(key, results.clone()).await;
        Ok(results)
    }
}

/// Map a decoded payload to the per-currency outcome. A missing asset fails
/// the batch; a missing conversion is a soft, data-carried failure.
fn interpret_payload(
    payload: QuotesLatestResponse,
    crypto_code: &str,
    currency: &str,
) -> Result<PriceResult, QuoteError> {
    let Some(asset) = payload.data.get(crypto_code) else {
        return Err(QuoteError::CryptocurrencyNotFound(crypto_code.to_string()));
    };

    match asset.quote.get(currency) {
        Some(quote) => Ok(PriceResult::ok(currency, quote.price)),
        None => {
            tracing::warn!(
                crypto_code = %crypto_code,
                currency = %currency,
                "Currency not present in upstream payload"
            );
            Ok(PriceResult::unavailable(
                currency,
                format!("Currency '{currency}' is not available."),
            ))
        }
    }
}

fn cache_key(crypto_code: &str, currencies: &[String]) -> String {
    format!("{}:{}", crypto_code, currencies.join("_"))
}

fn is_retriable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn retry_delay(attempt: u32) -> Duration {
    RETRY_BASE_DELAY * 2u32.saturating_pow(attempt.saturating_sub(1))
}
