//! Domain error taxonomy for the quote pipeline
//!
//! Per-currency "conversion missing" outcomes are deliberately NOT part of
//! this enum: they are carried as data in `PriceResult.error` so one bad
//! currency can never fail a whole batch.

use thiserror::Error;

/// Errors crossing the upstream-client / handler boundary.
#[derive(Debug, Error)]
pub enum QuoteError {
    /// Malformed inbound request (bad crypto or currency code).
    #[error("{0}")]
    Validation(String),

    /// The upstream provider does not know the requested asset at all.
    /// Fails the entire batch, not a single currency.
    #[error("Cryptocurrency '{0}' was not found.")]
    CryptocurrencyNotFound(String),

    /// Upstream answered but returned no usable prices.
    #[error("price for the cryptocurrency is not available.")]
    PriceNotAvailable,

    /// Transport-level failure: unreachable, error status, malformed payload.
    #[error("upstream service error: {0}")]
    Upstream(String),

    /// Anything else. Internal detail is logged but never sent to callers.
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl QuoteError {
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_the_asset() {
        let err = QuoteError::CryptocurrencyNotFound("XYZ".to_string());
        assert_eq!(err.to_string(), "Cryptocurrency 'XYZ' was not found.");
    }

    #[test]
    fn price_not_available_message_is_stable() {
        // Front-end and tests match on this exact text.
        assert_eq!(
            QuoteError::PriceNotAvailable.to_string(),
            "price for the cryptocurrency is not available."
        );
    }
}
