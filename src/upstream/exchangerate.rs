//! ExchangeRatesAPI client
//!
//! Fetches fiat exchange rates for a base currency. Not wired into the quote
//! request path; kept available for composing crypto prices from a single
//! USD quote plus fiat rates.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::QuoteError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Exchange rate of one target currency against the requested base.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRateResult {
    pub currency: String,
    pub rate: Option<f64>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct LatestRatesResponse {
    rates: Option<HashMap<String, f64>>,
}

/// HTTP client for exchangeratesapi.io-style endpoints.
pub struct ExchangeRateClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ExchangeRateClient {
    pub fn new(base_url: &str, api_key: &str) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Fetch rates for all `target_currencies` against `base_currency` in one
    /// request. Missing symbols come back as soft per-item failures.
    pub async fn get_exchange_rates(
        &self,
        base_currency: &str,
        target_currencies: &[String],
    ) -> Result<Vec<ExchangeRateResult>, QuoteError> {
        let symbols = target_currencies.join(",");
        let url = format!(
            "{}/latest?access_key={}&base={}&symbols={}",
            self.base_url, self.api_key, base_currency, symbols
        );
        tracing::debug!(base = %base_currency, symbols = %symbols, "Requesting exchange rates");

        let response = self.client.get(url).send().await.map_err(|e| {
            tracing::error!(error = %e, "Exchange rates service unreachable");
            QuoteError::upstream("Unable to reach the exchange rates service.")
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(status = %status, "ExchangeRatesAPI error");
            return Err(QuoteError::upstream(format!(
                "ExchangeRatesAPI error: {status}"
            )));
        }

        let payload: LatestRatesResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "Malformed exchange rates payload");
            QuoteError::upstream("Invalid response format from exchange rates service.")
        })?;

        let Some(rates) = payload.rates else {
            return Err(QuoteError::upstream(
                "Incomplete data received from exchange rates service.",
            ));
        };

        Ok(resolve_rates(&rates, target_currencies))
    }
}

fn resolve_rates(
    rates: &HashMap<String, f64>,
    target_currencies: &[String],
) -> Vec<ExchangeRateResult> {
    target_currencies
        .iter()
        .map(|currency| {
            let code = currency.to_uppercase();
            match rates.get(&code) {
                Some(&rate) => ExchangeRateResult {
                    currency: code,
                    rate: Some(rate),
                    error: None,
                },
                None => ExchangeRateResult {
                    error: Some(format!(
                        "Exchange rate for currency '{currency}' is not available."
                    )),
                    currency: code,
                    rate: None,
                },
            }
        })
        .collect()
}
