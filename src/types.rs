//! Core domain types shared across the quote pipeline

use serde::{Deserialize, Serialize};

/// Default fiat basket used when a request carries no explicit currencies
/// and by the background updater.
pub const DEFAULT_CURRENCIES: [&str; 5] = ["USD", "EUR", "BRL", "GBP", "AUD"];

/// Price of one asset in one target currency, as reported by an upstream
/// provider. Exactly one of `price`/`error` is set on the normal paths:
/// a present price, or a soft per-currency failure carried as data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceResult {
    pub currency: String,
    pub price: Option<f64>,
    pub error: Option<String>,
}

impl PriceResult {
    /// A successful quote for `currency`.
    pub fn ok(currency: impl Into<String>, price: f64) -> Self {
        Self {
            currency: currency.into(),
            price: Some(price),
            error: None,
        }
    }

    /// A soft failure: the asset is known but this conversion is missing.
    pub fn unavailable(currency: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
            price: None,
            error: Some(error.into()),
        }
    }
}

/// One row of the `GET /crypto/{cryptoCode}` response. Re-derived from the
/// upstream results so the response always has exactly one entry per
/// requested currency, in request order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteEntry {
    pub currency: String,
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Uppercase and de-duplicate currency codes, preserving first-seen order.
/// An empty input falls back to [`DEFAULT_CURRENCIES`].
pub fn normalize_currencies(input: &[String]) -> Vec<String> {
    if input.is_empty() {
        return DEFAULT_CURRENCIES.iter().map(|c| c.to_string()).collect();
    }

    let mut seen = Vec::with_capacity(input.len());
    for raw in input {
        let code = raw.trim().to_uppercase();
        if code.is_empty() || seen.contains(&code) {
            continue;
        }
        seen.push(code);
    }
    if seen.is_empty() {
        return DEFAULT_CURRENCIES.iter().map(|c| c.to_string()).collect();
    }
    seen
}

/// Fiat currency codes are exactly 3 ASCII letters.
pub fn is_valid_currency_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase())
}
