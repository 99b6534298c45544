use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One OHLCV candle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Ordered candles for one (symbol, timeframe), oldest first.
///
/// Construction rejects out-of-order or duplicate timestamps and
/// non-finite prices, so every indicator can rely on a clean series.
#[derive(Debug, Clone, Serialize)]
pub struct PriceSeries {
    symbol: String,
    timeframe: Timeframe,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe, bars: Vec<PriceBar>) -> Result<Self> {
        let symbol = symbol.into();

        for (i, bar) in bars.iter().enumerate() {
            let prices = [bar.open, bar.high, bar.low, bar.close];
            if prices.iter().any(|p| !p.is_finite() || *p < 0.0) {
                return Err(Error::MalformedSeries(format!(
                    "{symbol}: bar {i} has a non-finite or negative price"
                )));
            }
            if !bar.volume.is_finite() {
                return Err(Error::MalformedSeries(format!(
                    "{symbol}: bar {i} has a non-finite volume"
                )));
            }
        }

        if let Some(i) = bars
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(Error::MalformedSeries(format!(
                "{symbol}: timestamps not strictly increasing at bar {}",
                i + 1
            )));
        }

        Ok(Self {
            symbol,
            timeframe,
            bars,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Check that at least `needed` bars are present for `indicator`.
    ///
    /// An empty series is malformed (every indicator needs a latest bar);
    /// a short one is merely insufficient.
    pub fn require(&self, indicator: &str, needed: usize) -> Result<()> {
        if self.bars.is_empty() {
            return Err(Error::MalformedSeries(format!(
                "{}: empty series passed to {indicator}",
                self.symbol
            )));
        }
        if self.bars.len() < needed {
            return Err(Error::insufficient(indicator, needed, self.bars.len()));
        }
        Ok(())
    }
}

/// Bar interval. Names follow the chart API's interval strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h", alias = "60m")]
    H1,
    #[default]
    #[serde(rename = "1d")]
    D1,
    #[serde(rename = "1wk", alias = "1w")]
    W1,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::M30 => "30m",
            Timeframe::H1 => "1h",
            Timeframe::D1 => "1d",
            Timeframe::W1 => "1wk",
        }
    }

    /// History range requested per fetch. Intraday data is capped at 60 days
    /// by the upstream API; daily and weekly go back far enough for SMA(200).
    pub fn default_lookback(&self) -> &'static str {
        match self {
            Timeframe::M1 => "7d",
            Timeframe::M5 | Timeframe::M15 | Timeframe::M30 | Timeframe::H1 => "60d",
            Timeframe::D1 => "1y",
            Timeframe::W1 => "5y",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "1m" => Ok(Timeframe::M1),
            "5m" => Ok(Timeframe::M5),
            "15m" => Ok(Timeframe::M15),
            "30m" => Ok(Timeframe::M30),
            "1h" | "60m" => Ok(Timeframe::H1),
            "1d" => Ok(Timeframe::D1),
            "1wk" | "1w" => Ok(Timeframe::W1),
            other => Err(Error::Config(format!(
                "unsupported timeframe '{other}' (expected 1m, 5m, 15m, 30m, 1h, 1d or 1wk)"
            ))),
        }
    }
}

/// Directional bias, used both for a single indicator's lean and for the
/// overall confluence direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Bullish,
    Bearish,
    Neutral,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Bullish => write!(f, "bullish"),
            Direction::Bearish => write!(f, "bearish"),
            Direction::Neutral => write!(f, "neutral"),
        }
    }
}

/// The fixed set of indicators the scorer knows how to combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    Ema,
    Sma,
    Rsi,
    Bollinger,
    Fibonacci,
    /// Fast EMA above/below slow EMA.
    EmaTrend,
    /// Golden / death cross of two SMAs on the latest bar.
    SmaCross,
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IndicatorKind::Ema => "ema",
            IndicatorKind::Sma => "sma",
            IndicatorKind::Rsi => "rsi",
            IndicatorKind::Bollinger => "bollinger",
            IndicatorKind::Fibonacci => "fibonacci",
            IndicatorKind::EmaTrend => "ema_trend",
            IndicatorKind::SmaCross => "sma_cross",
        };
        f.write_str(s)
    }
}

/// Computed value(s) of one indicator on the latest bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorValue {
    Scalar(f64),
    Bands { upper: f64, middle: f64, lower: f64 },
    Pair { fast: f64, slow: f64 },
    Retracement {
        swing_high: f64,
        swing_low: f64,
        /// Ratio of the level nearest to the current price (0.0 ..= 1.0).
        ratio: f64,
        level: f64,
    },
}

/// One indicator's verdict on the latest bar of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorReading {
    pub kind: IndicatorKind,
    /// Display name including parameters, e.g. "RSI(14)".
    pub name: String,
    pub value: IndicatorValue,
    pub lean: Direction,
    pub weight: f64,
    /// Short explanation of the lean, e.g. "RSI overbought".
    pub note: String,
}

/// Coarse strength class used for alert deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrengthBucket {
    Weak,
    Moderate,
    Strong,
}

impl fmt::Display for StrengthBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrengthBucket::Weak => write!(f, "weak"),
            StrengthBucket::Moderate => write!(f, "moderate"),
            StrengthBucket::Strong => write!(f, "strong"),
        }
    }
}

/// Whether a signal reflects a real reading or a fallback because too few
/// indicators could be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Sufficient,
    InsufficientData,
}

/// Result of one scorer invocation. Never mutated once shared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfluenceSignal {
    pub symbol: String,
    pub timeframe: Timeframe,
    /// Timestamp of the bar the signal was computed on.
    pub bar_time: DateTime<Utc>,
    /// Close of that bar.
    pub price: f64,
    pub direction: Direction,
    /// Share of indicator weight agreeing with `direction`, 0..=100.
    pub strength: f64,
    pub bucket: StrengthBucket,
    pub confidence: Confidence,
    /// Readings that agree with `direction`, heaviest first.
    pub factors: Vec<IndicatorReading>,
    /// Readings that were computed in total.
    pub indicators_computed: usize,
    pub market_open: bool,
}

impl ConfluenceSignal {
    pub fn is_insufficient(&self) -> bool {
        self.confidence == Confidence::InsufficientData
    }

    /// Annotate with the instrument's session status.
    pub fn with_market_open(mut self, open: bool) -> Self {
        self.market_open = open;
        self
    }
}

/// Trading hours of a fixed-session exchange, in the exchange's local time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeHours {
    pub name: String,
    /// Local time offset from UTC, in seconds east.
    pub utc_offset_secs: i32,
    pub open: NaiveTime,
    /// Inclusive.
    pub close: NaiveTime,
    /// Local dates with no session. Empty = weekday-only approximation.
    pub holidays: Vec<NaiveDate>,
}

/// How an instrument's market session is determined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketCategory {
    FixedHours(ExchangeHours),
    /// Crypto and anything else that trades around the clock.
    AlwaysOn,
}

/// One scheduled (symbol, timeframe) alert feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub symbol: String,
    #[serde(default)]
    pub timeframe: Timeframe,
    /// Seconds between evaluations.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Telegram chat id alerts are posted to.
    pub destination: i64,
    /// Named session from config (e.g. "nse") or "always_on". When absent
    /// the session is inferred from the symbol.
    #[serde(default)]
    pub market: Option<String>,
}

fn default_interval_secs() -> u64 {
    300
}

impl fmt::Display for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.symbol, self.timeframe)
    }
}
