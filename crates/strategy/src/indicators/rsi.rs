use common::{Direction, IndicatorKind, IndicatorReading, IndicatorValue, PriceSeries, Result};

use super::reading;
use crate::Indicator;

/// RSI (Relative Strength Index) indicator.
///
/// Uses Wilder's smoothed moving average (same as TradingView / standard RSI).
/// Needs at least `period` closes; the seed averages cover the first
/// `min(period, len - 1)` price changes.
#[derive(Debug, Clone)]
pub struct RsiIndicator {
    pub period: usize,
    pub overbought: f64,
    pub oversold: f64,
}

impl RsiIndicator {
    pub fn new(period: usize, overbought: f64, oversold: f64) -> Self {
        Self { period, overbought, oversold }
    }

    /// Compute RSI from a slice of close prices (oldest first).
    /// Returns `None` if there are fewer than `period` values (or fewer than 2).
    pub fn compute(&self, closes: &[f64]) -> Option<f64> {
        if self.period < 2 || closes.len() < self.period {
            return None;
        }

        let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
        let seed_len = self.period.min(changes.len());
        let initial = &changes[..seed_len];

        let mut avg_gain = initial.iter().filter(|&&c| c > 0.0).sum::<f64>() / seed_len as f64;
        let mut avg_loss =
            initial.iter().filter(|&&c| c < 0.0).map(|c| c.abs()).sum::<f64>() / seed_len as f64;

        // Wilder smoothing over remaining changes
        let p = self.period as f64;
        for &change in &changes[seed_len..] {
            let gain = if change > 0.0 { change } else { 0.0 };
            let loss = if change < 0.0 { change.abs() } else { 0.0 };
            avg_gain = (avg_gain * (p - 1.0) + gain) / p;
            avg_loss = (avg_loss * (p - 1.0) + loss) / p;
        }

        if avg_loss == 0.0 {
            // Flat series: no momentum either way.
            return Some(if avg_gain == 0.0 { 50.0 } else { 100.0 });
        }

        let rs = avg_gain / avg_loss;
        Some((100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0))
    }
}

impl Indicator for RsiIndicator {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::Rsi
    }

    fn name(&self) -> String {
        format!("RSI({})", self.period)
    }

    fn min_bars(&self) -> usize {
        self.period.max(2)
    }

    fn read(&self, series: &PriceSeries) -> Result<IndicatorReading> {
        let name = self.name();
        series.require(&name, self.min_bars())?;
        let closes = series.closes();
        let Some(rsi) = self.compute(&closes) else {
            return Err(common::Error::insufficient(name, self.min_bars(), closes.len()));
        };

        let (lean, note) = if rsi > self.overbought {
            (Direction::Bearish, format!("RSI overbought ({rsi:.1})"))
        } else if rsi < self.oversold {
            (Direction::Bullish, format!("RSI oversold ({rsi:.1})"))
        } else {
            (Direction::Neutral, format!("RSI neutral ({rsi:.1})"))
        };
        Ok(reading(self.kind(), name, IndicatorValue::Scalar(rsi), lean, note))
    }
}
