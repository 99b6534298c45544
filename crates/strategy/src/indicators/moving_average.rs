use common::{Direction, IndicatorKind, IndicatorReading, IndicatorValue, PriceSeries, Result};

use super::reading;
use crate::Indicator;

/// Simple moving average of the last `period` values.
/// Returns `None` if there are fewer than `period` values.
pub fn sma(data: &[f64], period: usize) -> Option<f64> {
    if period == 0 || data.len() < period {
        return None;
    }
    let window = &data[data.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

/// Exponential moving average at the last value of `data`.
///
/// Seeded with the SMA of the first `period` values, then smoothed with
/// `k = 2 / (period + 1)` over every later value.
pub fn ema(data: &[f64], period: usize) -> Option<f64> {
    if period == 0 || data.len() < period {
        return None;
    }
    let k = 2.0 / (period as f64 + 1.0);
    let mut value = data[..period].iter().sum::<f64>() / period as f64;
    for &price in &data[period..] {
        value = price * k + value * (1.0 - k);
    }
    Some(value)
}

fn lean_against(price: f64, average: f64, label: &str) -> (Direction, String) {
    if price > average {
        (Direction::Bullish, format!("Price above {label}"))
    } else if price < average {
        (Direction::Bearish, format!("Price below {label}"))
    } else {
        (Direction::Neutral, format!("Price at {label}"))
    }
}

/// Price relative to its simple moving average.
#[derive(Debug, Clone)]
pub struct SmaIndicator {
    pub period: usize,
}

impl SmaIndicator {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for SmaIndicator {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::Sma
    }

    fn name(&self) -> String {
        format!("SMA({})", self.period)
    }

    fn min_bars(&self) -> usize {
        self.period
    }

    fn read(&self, series: &PriceSeries) -> Result<IndicatorReading> {
        let name = self.name();
        series.require(&name, self.min_bars())?;
        let closes = series.closes();
        let price = closes[closes.len() - 1];
        let Some(average) = sma(&closes, self.period) else {
            return Err(common::Error::insufficient(name, self.period, closes.len()));
        };
        let (lean, note) = lean_against(price, average, &name);
        Ok(reading(self.kind(), name, IndicatorValue::Scalar(average), lean, note))
    }
}

/// Price relative to its exponential moving average.
#[derive(Debug, Clone)]
pub struct EmaIndicator {
    pub period: usize,
}

impl EmaIndicator {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for EmaIndicator {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::Ema
    }

    fn name(&self) -> String {
        format!("EMA({})", self.period)
    }

    fn min_bars(&self) -> usize {
        self.period
    }

    fn read(&self, series: &PriceSeries) -> Result<IndicatorReading> {
        let name = self.name();
        series.require(&name, self.min_bars())?;
        let closes = series.closes();
        let price = closes[closes.len() - 1];
        let Some(average) = ema(&closes, self.period) else {
            return Err(common::Error::insufficient(name, self.period, closes.len()));
        };
        let (lean, note) = lean_against(price, average, &name);
        Ok(reading(self.kind(), name, IndicatorValue::Scalar(average), lean, note))
    }
}
