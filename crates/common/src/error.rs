use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Series is shorter than an indicator's window. Non-fatal: the
    /// indicator is skipped and the scorer may fall back to a
    /// low-confidence neutral signal.
    #[error("insufficient data for {indicator}: need {needed} bars, have {available}")]
    InsufficientData {
        indicator: String,
        needed: usize,
        available: usize,
    },

    /// Ordering or integrity violation in a price series. Fatal to the
    /// evaluation that hit it.
    #[error("malformed price series: {0}")]
    MalformedSeries(String),

    #[error("data fetch failed for {symbol}: {reason}")]
    DataFetch { symbol: String, reason: String },

    #[error("delivery to {destination} failed: {reason}")]
    Delivery { destination: i64, reason: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn insufficient(indicator: impl Into<String>, needed: usize, available: usize) -> Self {
        Error::InsufficientData {
            indicator: indicator.into(),
            needed,
            available,
        }
    }

    /// True for the one error kind that degrades a signal instead of failing it.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, Error::InsufficientData { .. })
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
