use std::collections::HashMap;

use tracing::{debug, info};

use common::{Error, IndicatorReading, PriceSeries, Result};

use crate::config::IndicatorConfig;
use crate::indicators::{
    BollingerIndicator, EmaIndicator, EmaTrendIndicator, FibonacciIndicator, RsiIndicator,
    SmaCrossIndicator, SmaIndicator,
};
use crate::Indicator;

/// Holds the configured indicators and runs them over a series.
pub struct IndicatorRegistry {
    indicators: Vec<(Box<dyn Indicator>, f64)>,
}

impl IndicatorRegistry {
    /// Build the registry from config, rejecting unknown types and bad params.
    pub fn from_config(configs: &[IndicatorConfig]) -> Result<Self> {
        let mut indicators: Vec<(Box<dyn Indicator>, f64)> = Vec::new();

        for cfg in configs {
            let indicator = build_indicator(cfg).map_err(|e| {
                Error::Config(format!("indicator '{}': {e}", cfg.indicator_type))
            })?;
            info!(name = %indicator.name(), weight = cfg.weight, "Registered indicator");
            indicators.push((indicator, cfg.weight));
        }

        Ok(Self { indicators })
    }

    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }

    /// Longest window among the configured indicators.
    pub fn max_min_bars(&self) -> usize {
        self.indicators
            .iter()
            .map(|(i, _)| i.min_bars())
            .max()
            .unwrap_or(0)
    }

    /// Run every indicator over `series`.
    ///
    /// Indicators without enough history are skipped; any other error (a
    /// malformed series) aborts the whole evaluation.
    pub fn read_all(&self, series: &PriceSeries) -> Result<Vec<IndicatorReading>> {
        let mut readings = Vec::with_capacity(self.indicators.len());
        for (indicator, weight) in &self.indicators {
            match indicator.read(series) {
                Ok(mut reading) => {
                    reading.weight = *weight;
                    readings.push(reading);
                }
                Err(e) if e.is_insufficient_data() => {
                    debug!(symbol = %series.symbol(), error = %e, "Skipping indicator");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(readings)
    }
}

// ─── Indicator builders ───────────────────────────────────────────────────────

fn build_indicator(cfg: &IndicatorConfig) -> Result<Box<dyn Indicator>, String> {
    let p = &cfg.params;
    match cfg.indicator_type.as_str() {
        "sma" => {
            let period = positive(param_usize(p, "period", 50), "period")?;
            Ok(Box::new(SmaIndicator::new(period)))
        }
        "ema" => {
            let period = positive(param_usize(p, "period", 21), "period")?;
            Ok(Box::new(EmaIndicator::new(period)))
        }
        "rsi" => {
            let period = param_usize(p, "period", 14);
            let overbought = param_f64(p, "overbought", 70.0);
            let oversold = param_f64(p, "oversold", 30.0);
            if period < 2 {
                return Err("period must be >= 2".into());
            }
            if !(0.0..=100.0).contains(&oversold) || !(oversold..=100.0).contains(&overbought) {
                return Err("need 0 <= oversold <= overbought <= 100".into());
            }
            Ok(Box::new(RsiIndicator::new(period, overbought, oversold)))
        }
        "bollinger" => {
            let period = positive(param_usize(p, "period", 20), "period")?;
            let num_std = param_f64(p, "num_std", 2.0);
            if !num_std.is_finite() || num_std <= 0.0 {
                return Err("num_std must be > 0".into());
            }
            Ok(Box::new(BollingerIndicator::new(period, num_std)))
        }
        "fibonacci" => {
            let lookback = param_usize(p, "lookback", 25);
            let tolerance = param_f64(p, "tolerance", 0.005);
            if lookback < 2 {
                return Err("lookback must be >= 2".into());
            }
            if !tolerance.is_finite() || tolerance < 0.0 {
                return Err("tolerance must be >= 0".into());
            }
            Ok(Box::new(FibonacciIndicator::new(lookback, tolerance)))
        }
        "ema_trend" => {
            let (fast, slow) = fast_slow(p, 9, 21)?;
            Ok(Box::new(EmaTrendIndicator::new(fast, slow)))
        }
        "sma_cross" => {
            let (fast, slow) = fast_slow(p, 50, 200)?;
            Ok(Box::new(SmaCrossIndicator::new(fast, slow)))
        }
        other => Err(format!("unknown type '{other}'")),
    }
}

fn positive(value: usize, name: &str) -> Result<usize, String> {
    if value == 0 {
        Err(format!("{name} must be > 0"))
    } else {
        Ok(value)
    }
}

fn fast_slow(
    params: &HashMap<String, toml::Value>,
    fast_default: usize,
    slow_default: usize,
) -> Result<(usize, usize), String> {
    let fast = positive(param_usize(params, "fast", fast_default), "fast")?;
    let slow = positive(param_usize(params, "slow", slow_default), "slow")?;
    if fast >= slow {
        return Err("fast period must be less than slow period".into());
    }
    Ok((fast, slow))
}

fn param_f64(params: &HashMap<String, toml::Value>, key: &str, default: f64) -> f64 {
    params
        .get(key)
        .and_then(|v| v.as_float().or_else(|| v.as_integer().map(|i| i as f64)))
        .unwrap_or(default)
}

fn param_usize(params: &HashMap<String, toml::Value>, key: &str, default: usize) -> usize {
    params
        .get(key)
        .and_then(|v| v.as_integer())
        .map(|v| v.max(0) as usize)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_indicators;
    use crate::indicators::test_support::series_from_closes;

    #[test]
    fn default_set_builds() {
        let reg = IndicatorRegistry::from_config(&default_indicators()).unwrap();
        assert_eq!(reg.len(), 7);
        assert_eq!(reg.max_min_bars(), 201);
    }

    #[test]
    fn unknown_type_rejected() {
        let cfg = IndicatorConfig::new("macd", &[]);
        assert!(IndicatorRegistry::from_config(&[cfg]).is_err());
    }

    #[test]
    fn inverted_fast_slow_rejected() {
        let cfg = IndicatorConfig::new(
            "ema_trend",
            &[("fast", toml::Value::Integer(30)), ("slow", toml::Value::Integer(10))],
        );
        assert!(IndicatorRegistry::from_config(&[cfg]).is_err());
    }

    #[test]
    fn short_series_skips_long_windows() {
        let reg = IndicatorRegistry::from_config(&default_indicators()).unwrap();
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let readings = reg.read_all(&series_from_closes(&closes)).unwrap();
        // SMA(50) and the 50/200 cross need more than 30 bars.
        assert_eq!(readings.len(), 5);
    }

    #[test]
    fn empty_series_is_an_error() {
        let reg = IndicatorRegistry::from_config(&default_indicators()).unwrap();
        let empty = PriceSeries::new("X", common::Timeframe::D1, vec![]).unwrap();
        assert!(matches!(reg.read_all(&empty), Err(Error::MalformedSeries(_))));
    }

    #[test]
    fn configured_weight_applied() {
        let mut cfg = IndicatorConfig::new("sma", &[("period", toml::Value::Integer(3))]);
        cfg.weight = 2.5;
        let reg = IndicatorRegistry::from_config(&[cfg]).unwrap();
        let readings = reg.read_all(&series_from_closes(&[1.0, 2.0, 3.0])).unwrap();
        assert_eq!(readings[0].weight, 2.5);
    }
}
