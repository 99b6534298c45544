use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use common::{ConfluenceSignal, Error, MarketDataSource, Result, Timeframe};
use strategy::SignalEngine;

use crate::session::SessionGate;

/// Fetch → indicators → scorer, shared by the scheduler and manual commands.
pub struct Analyzer {
    source: Arc<dyn MarketDataSource>,
    engine: SignalEngine,
    gate: SessionGate,
    fetch_timeout: Duration,
}

impl Analyzer {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        engine: SignalEngine,
        gate: SessionGate,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            source,
            engine,
            gate,
            fetch_timeout,
        }
    }

    pub fn gate(&self) -> &SessionGate {
        &self.gate
    }

    pub fn engine(&self) -> &SignalEngine {
        &self.engine
    }

    /// Fetch fresh bars and score them. Does not consult the session gate.
    ///
    /// A fetch that errors or exceeds the timeout is `Error::DataFetch`.
    pub async fn evaluate(&self, symbol: &str, timeframe: Timeframe) -> Result<ConfluenceSignal> {
        let lookback = timeframe.default_lookback();
        let fetch = self.source.fetch(symbol, timeframe, lookback);
        let series = match tokio::time::timeout(self.fetch_timeout, fetch).await {
            Ok(Ok(series)) => series,
            Ok(Err(e @ Error::DataFetch { .. })) => return Err(e),
            Ok(Err(e @ Error::MalformedSeries(_))) => return Err(e),
            Ok(Err(e)) => {
                return Err(Error::DataFetch {
                    symbol: symbol.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(Error::DataFetch {
                    symbol: symbol.to_string(),
                    reason: format!("timed out after {:?}", self.fetch_timeout),
                })
            }
        };
        debug!(symbol, %timeframe, bars = series.len(), "Fetched series");
        self.engine.evaluate(&series)
    }

    /// On-demand analysis. Ignores the session gate but annotates the
    /// result when the market is closed.
    pub async fn manual(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        market: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ConfluenceSignal> {
        let open = self.gate.is_open(symbol, market, now);
        let signal = self.evaluate(symbol, timeframe).await?;
        Ok(signal.with_market_open(open))
    }
}
