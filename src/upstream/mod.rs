//! Upstream price providers
//!
//! `QuoteClient` is the seam between the HTTP/broadcast layers and the
//! external pricing APIs; handlers and the background updater only ever see
//! the trait.

pub mod coinmarketcap;
pub mod exchangerate;

pub use coinmarketcap::CoinMarketCapClient;
pub use exchangerate::{ExchangeRateClient, ExchangeRateResult};

use crate::error::QuoteError;
use crate::types::PriceResult;
use async_trait::async_trait;

/// Fetches the price of one asset in a set of target currencies.
///
/// Implementations must return one `PriceResult` per successfully resolved
/// currency; a currency the provider cannot convert to is a soft failure
/// carried inside the result, never an `Err`. Cancellation propagates by
/// dropping the returned future.
#[async_trait]
pub trait QuoteClient: Send + Sync {
    async fn get_prices(
        &self,
        crypto_code: &str,
        currencies: &[String],
    ) -> Result<Vec<PriceResult>, QuoteError>;
}
