use async_trait::async_trait;

use crate::{PriceSeries, Result, Timeframe};

/// Abstraction over the market-data provider.
///
/// `YahooClient` in `crates/engine` implements this for live data; tests
/// use in-memory fakes. Implementations must return bars oldest first with
/// strictly increasing timestamps.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch up to `lookback` of history (e.g. "60d") for `symbol` at
    /// `timeframe` resolution.
    async fn fetch(&self, symbol: &str, timeframe: Timeframe, lookback: &str) -> Result<PriceSeries>;
}
