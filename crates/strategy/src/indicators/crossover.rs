use common::{Direction, IndicatorKind, IndicatorReading, IndicatorValue, PriceSeries, Result};

use super::{ema, reading, sma};
use crate::Indicator;

/// Trend filter: fast EMA above slow EMA is an uptrend.
#[derive(Debug, Clone)]
pub struct EmaTrendIndicator {
    pub fast: usize,
    pub slow: usize,
}

impl EmaTrendIndicator {
    pub fn new(fast: usize, slow: usize) -> Self {
        Self { fast, slow }
    }
}

impl Indicator for EmaTrendIndicator {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::EmaTrend
    }

    fn name(&self) -> String {
        format!("EMA{}/EMA{}", self.fast, self.slow)
    }

    fn min_bars(&self) -> usize {
        self.fast.max(self.slow)
    }

    fn read(&self, series: &PriceSeries) -> Result<IndicatorReading> {
        let name = self.name();
        series.require(&name, self.min_bars())?;
        let closes = series.closes();
        let (Some(fast), Some(slow)) = (ema(&closes, self.fast), ema(&closes, self.slow)) else {
            return Err(common::Error::insufficient(name, self.min_bars(), closes.len()));
        };

        let (lean, note) = if fast > slow {
            (Direction::Bullish, format!("EMA{} > EMA{}", self.fast, self.slow))
        } else if fast < slow {
            (Direction::Bearish, format!("EMA{} < EMA{}", self.fast, self.slow))
        } else {
            (Direction::Neutral, format!("EMA{} = EMA{}", self.fast, self.slow))
        };
        Ok(reading(self.kind(), name, IndicatorValue::Pair { fast, slow }, lean, note))
    }
}

/// Golden / death cross: the fast SMA crossing the slow SMA on the latest bar.
/// Anything other than a fresh cross is neutral.
#[derive(Debug, Clone)]
pub struct SmaCrossIndicator {
    pub fast: usize,
    pub slow: usize,
}

impl SmaCrossIndicator {
    pub fn new(fast: usize, slow: usize) -> Self {
        Self { fast, slow }
    }
}

impl Indicator for SmaCrossIndicator {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::SmaCross
    }

    fn name(&self) -> String {
        format!("SMA{}/SMA{} cross", self.fast, self.slow)
    }

    /// Needs the previous bar's averages as well.
    fn min_bars(&self) -> usize {
        self.fast.max(self.slow) + 1
    }

    fn read(&self, series: &PriceSeries) -> Result<IndicatorReading> {
        let name = self.name();
        series.require(&name, self.min_bars())?;
        let closes = series.closes();
        let prev = &closes[..closes.len() - 1];

        let (Some(fast), Some(slow), Some(fast_prev), Some(slow_prev)) = (
            sma(&closes, self.fast),
            sma(&closes, self.slow),
            sma(prev, self.fast),
            sma(prev, self.slow),
        ) else {
            return Err(common::Error::insufficient(name, self.min_bars(), closes.len()));
        };

        let (lean, note) = if fast > slow && fast_prev <= slow_prev {
            (Direction::Bullish, "Golden Cross")
        } else if fast < slow && fast_prev >= slow_prev {
            (Direction::Bearish, "Death Cross")
        } else {
            (Direction::Neutral, "No fresh SMA cross")
        };
        Ok(reading(self.kind(), name, IndicatorValue::Pair { fast, slow }, lean, note))
    }
}
