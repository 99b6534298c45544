use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use common::{Error, ExchangeHours, Result, Subscription};

use crate::confluence::ScoringConfig;
use crate::plan::PlanConfig;

/// Top-level bot config file (TOML).
///
/// Example `config/bot.toml`:
/// ```toml
/// [[subscription]]
/// symbol = "SOL-USD"
/// timeframe = "5m"
/// interval_secs = 300
/// destination = -1001234567890
///
/// [scoring]
/// min_indicators = 3
/// moderate_threshold = 40.0
/// strong_threshold = 70.0
///
/// [[indicator]]
/// type = "rsi"
/// weight = 1.5
///
/// [indicator.params]
/// period = 14
/// overbought = 70.0
/// oversold = 30.0
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotFileConfig {
    #[serde(rename = "subscription", default)]
    pub subscriptions: Vec<Subscription>,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub plan: PlanConfig,
    /// Indicators fed to the scorer. Defaults to the built-in set.
    #[serde(rename = "indicator", default = "default_indicators")]
    pub indicators: Vec<IndicatorConfig>,
    /// Named fixed-hours sessions, referenced by `Subscription::market`.
    #[serde(rename = "session", default)]
    pub sessions: Vec<SessionConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndicatorConfig {
    /// Indicator type identifier: "ema", "sma", "rsi", "bollinger",
    /// "fibonacci", "ema_trend" or "sma_cross".
    #[serde(rename = "type")]
    pub indicator_type: String,
    /// Relative weight in the confluence score.
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Indicator-specific parameters.
    #[serde(default)]
    pub params: HashMap<String, toml::Value>,
}

fn default_weight() -> f64 {
    1.0
}

impl IndicatorConfig {
    pub fn new(indicator_type: &str, params: &[(&str, toml::Value)]) -> Self {
        Self {
            indicator_type: indicator_type.to_string(),
            weight: default_weight(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }
}

/// Built-in indicator set: the EMA 9/21 trend, RSI(14), Bollinger(20, 2),
/// Fibonacci over 25 bars, the SMA 50/200 cross, and price against
/// SMA(50) and EMA(21).
pub fn default_indicators() -> Vec<IndicatorConfig> {
    use toml::Value::{Float, Integer};
    vec![
        IndicatorConfig::new("ema_trend", &[("fast", Integer(9)), ("slow", Integer(21))]),
        IndicatorConfig::new(
            "rsi",
            &[("period", Integer(14)), ("overbought", Float(70.0)), ("oversold", Float(30.0))],
        ),
        IndicatorConfig::new("bollinger", &[("period", Integer(20)), ("num_std", Float(2.0))]),
        IndicatorConfig::new("fibonacci", &[("lookback", Integer(25)), ("tolerance", Float(0.005))]),
        IndicatorConfig::new("sma_cross", &[("fast", Integer(50)), ("slow", Integer(200))]),
        IndicatorConfig::new("sma", &[("period", Integer(50))]),
        IndicatorConfig::new("ema", &[("period", Integer(21))]),
    ]
}

/// A fixed-hours exchange session as written in the config file.
///
/// ```toml
/// [[session]]
/// name = "nse"
/// utc_offset = "+05:30"
/// open = "09:15"
/// close = "15:30"
/// holidays = ["2026-10-21"]
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    pub name: String,
    pub utc_offset: String,
    pub open: String,
    pub close: String,
    #[serde(default)]
    pub holidays: Vec<String>,
}

impl SessionConfig {
    pub fn to_hours(&self) -> Result<ExchangeHours> {
        let bad = |what: &str, value: &str| {
            Error::Config(format!("session '{}': invalid {what} '{value}'", self.name))
        };
        let utc_offset_secs =
            parse_utc_offset(&self.utc_offset).ok_or_else(|| bad("utc_offset", &self.utc_offset))?;
        let open = parse_time(&self.open).ok_or_else(|| bad("open", &self.open))?;
        let close = parse_time(&self.close).ok_or_else(|| bad("close", &self.close))?;
        if close <= open {
            return Err(bad("close (must be after open)", &self.close));
        }
        let holidays = self
            .holidays
            .iter()
            .map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").map_err(|_| bad("holiday", d)))
            .collect::<Result<Vec<_>>>()?;

        Ok(ExchangeHours {
            name: self.name.to_lowercase(),
            utc_offset_secs,
            open,
            close,
            holidays,
        })
    }
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s.trim(), "%H:%M:%S"))
        .ok()
}

/// "+05:30" / "-04:00" / "Z" → seconds east of UTC.
fn parse_utc_offset(s: &str) -> Option<i32> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return Some(0);
    }
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let (h, m) = rest.split_once(':').unwrap_or((rest, "0"));
    let hours: i32 = h.parse().ok()?;
    let minutes: i32 = m.parse().ok()?;
    if !(0..=14).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }
    Some(sign * (hours * 3600 + minutes * 60))
}

impl BotFileConfig {
    /// Load and validate from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read bot config at '{path}': {e}")))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        self.scoring.validate()?;
        self.plan.validate()?;

        for sub in &self.subscriptions {
            if sub.symbol.trim().is_empty() {
                return Err(Error::Config("subscription with empty symbol".into()));
            }
            if sub.interval_secs == 0 {
                return Err(Error::Config(format!("{sub}: interval_secs must be > 0")));
            }
        }

        let mut seen = std::collections::HashSet::new();
        for sub in &self.subscriptions {
            if !seen.insert((sub.symbol.as_str(), sub.timeframe, sub.destination)) {
                return Err(Error::Config(format!("{sub}: duplicate subscription")));
            }
        }

        for ind in &self.indicators {
            if !ind.weight.is_finite() || ind.weight <= 0.0 {
                return Err(Error::Config(format!(
                    "indicator '{}': weight must be a positive number",
                    ind.indicator_type
                )));
            }
        }

        for session in &self.sessions {
            session.to_hours()?;
        }
        Ok(())
    }

    /// Parsed fixed-hours sessions.
    pub fn exchange_hours(&self) -> Result<Vec<ExchangeHours>> {
        self.sessions.iter().map(SessionConfig::to_hours).collect()
    }
}
