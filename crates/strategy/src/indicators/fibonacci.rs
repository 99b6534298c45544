use common::{Direction, IndicatorKind, IndicatorReading, IndicatorValue, PriceSeries, Result};

use super::reading;
use crate::Indicator;

/// Retracement ratios measured down from the swing high.
pub const FIB_RATIOS: [f64; 7] = [0.0, 0.236, 0.382, 0.5, 0.618, 0.786, 1.0];

/// `(ratio, price)` for every level between `swing_high` and `swing_low`.
pub fn retracement_levels(swing_high: f64, swing_low: f64) -> Vec<(f64, f64)> {
    let range = swing_high - swing_low;
    FIB_RATIOS
        .iter()
        .map(|&r| (r, swing_high - range * r))
        .collect()
}

/// Fibonacci retracement over the trailing swing.
///
/// The swing is the highest high and lowest low of the last `lookback` bars.
/// When the latest close sits within `tolerance` (fraction of price) of the
/// nearest level, that level reads as support (at or below price, bullish)
/// or resistance (above price, bearish).
#[derive(Debug, Clone)]
pub struct FibonacciIndicator {
    pub lookback: usize,
    pub tolerance: f64,
}

impl FibonacciIndicator {
    pub fn new(lookback: usize, tolerance: f64) -> Self {
        Self { lookback, tolerance }
    }
}

impl Indicator for FibonacciIndicator {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::Fibonacci
    }

    fn name(&self) -> String {
        format!("Fib({})", self.lookback)
    }

    fn min_bars(&self) -> usize {
        self.lookback.max(1)
    }

    fn read(&self, series: &PriceSeries) -> Result<IndicatorReading> {
        let name = self.name();
        series.require(&name, self.min_bars())?;
        let bars = series.bars();
        let window = &bars[bars.len() - self.min_bars()..];
        let price = bars[bars.len() - 1].close;

        let swing_high = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
        let swing_low = window.iter().map(|b| b.low).fold(f64::MAX, f64::min);

        if swing_high <= swing_low {
            let value = IndicatorValue::Retracement {
                swing_high,
                swing_low,
                ratio: 0.0,
                level: swing_high,
            };
            return Ok(reading(self.kind(), name, value, Direction::Neutral, "Flat range, no Fib levels"));
        }

        let (ratio, level) = retracement_levels(swing_high, swing_low)
            .into_iter()
            .min_by(|a, b| (price - a.1).abs().total_cmp(&(price - b.1).abs()))
            .unwrap_or((0.0, swing_high));

        let distance = (price - level).abs();
        let label = format!("{:.1}%", ratio * 100.0);
        let (lean, note) = if price > 0.0 && distance / price <= self.tolerance {
            // Within float noise of the level counts as sitting on support.
            if level <= price || distance <= price * 1e-9 {
                (Direction::Bullish, format!("Price at {label} Fib support"))
            } else {
                (Direction::Bearish, format!("Price at {label} Fib resistance"))
            }
        } else {
            (Direction::Neutral, format!("Nearest Fib level {label} out of range"))
        };

        let value = IndicatorValue::Retracement {
            swing_high,
            swing_low,
            ratio,
            level,
        };
        Ok(reading(self.kind(), name, value, lean, note))
    }
}
