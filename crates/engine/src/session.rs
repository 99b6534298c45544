use std::collections::HashMap;

use chrono::{DateTime, Datelike, FixedOffset, NaiveTime, Offset, Utc, Weekday};
use tracing::warn;

use common::{Error, ExchangeHours, MarketCategory, Result, Subscription};

/// Market name that forces round-the-clock trading.
pub const ALWAYS_ON: &str = "always_on";

/// National Stock Exchange of India: 09:15–15:30 IST, Monday to Friday.
/// No holiday calendar unless configured.
pub fn nse_hours() -> ExchangeHours {
    ExchangeHours {
        name: "nse".to_string(),
        utc_offset_secs: 5 * 3600 + 30 * 60,
        open: NaiveTime::from_hms_opt(9, 15, 0).unwrap_or(NaiveTime::MIN),
        close: NaiveTime::from_hms_opt(15, 30, 0).unwrap_or(NaiveTime::MIN),
        holidays: Vec::new(),
    }
}

/// True if `category` is in session at `now`.
///
/// Fixed-hours markets are open on weekdays that are not configured
/// holidays, between `open` and `close` inclusive, in exchange-local time.
pub fn is_open(category: &MarketCategory, now: DateTime<Utc>) -> bool {
    match category {
        MarketCategory::AlwaysOn => true,
        MarketCategory::FixedHours(hours) => {
            let offset = FixedOffset::east_opt(hours.utc_offset_secs).unwrap_or_else(|| Utc.fix());
            let local = now.with_timezone(&offset);
            if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
                return false;
            }
            if hours.holidays.contains(&local.date_naive()) {
                return false;
            }
            let t = local.time();
            t >= hours.open && t <= hours.close
        }
    }
}

/// Resolves which session applies to a symbol and answers "is it open?".
#[derive(Debug, Clone)]
pub struct SessionGate {
    sessions: HashMap<String, ExchangeHours>,
}

impl Default for SessionGate {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl SessionGate {
    /// Built-in sessions plus `configured`; a configured session with the
    /// same name replaces the built-in one.
    pub fn new(configured: Vec<ExchangeHours>) -> Self {
        let mut sessions = HashMap::new();
        let nse = nse_hours();
        sessions.insert(nse.name.clone(), nse);
        for hours in configured {
            sessions.insert(hours.name.to_lowercase(), hours);
        }
        Self { sessions }
    }

    /// Reject subscriptions naming a session that does not exist.
    pub fn validate(&self, subscriptions: &[Subscription]) -> Result<()> {
        for sub in subscriptions {
            if let Some(market) = &sub.market {
                let key = market.to_lowercase();
                if key != ALWAYS_ON && !self.sessions.contains_key(&key) {
                    return Err(Error::Config(format!("{sub}: unknown market '{market}'")));
                }
            }
        }
        Ok(())
    }

    /// Explicit `market` wins; otherwise Indian listings (`.NS`, `.BO`) use
    /// the NSE session and everything else trades around the clock.
    pub fn category_for(&self, symbol: &str, market: Option<&str>) -> MarketCategory {
        let key = match market {
            Some(m) => m.to_lowercase(),
            None => {
                let upper = symbol.to_uppercase();
                if upper.ends_with(".NS") || upper.ends_with(".BO") {
                    "nse".to_string()
                } else {
                    return MarketCategory::AlwaysOn;
                }
            }
        };
        if key == ALWAYS_ON {
            return MarketCategory::AlwaysOn;
        }
        match self.sessions.get(&key) {
            Some(hours) => MarketCategory::FixedHours(hours.clone()),
            None => {
                warn!(symbol, market = %key, "Unknown market, treating as always open");
                MarketCategory::AlwaysOn
            }
        }
    }

    pub fn is_open(&self, symbol: &str, market: Option<&str>, now: DateTime<Utc>) -> bool {
        is_open(&self.category_for(symbol, market), now)
    }
}
