use common::{Direction, IndicatorKind, IndicatorReading, IndicatorValue, PriceSeries, Result};

use super::reading;
use crate::Indicator;

/// Middle, upper and lower band on the latest bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Bollinger Bands: middle = SMA(period), upper/lower = middle ± k·σ, where
/// σ is the population standard deviation of the same window.
#[derive(Debug, Clone)]
pub struct BollingerIndicator {
    pub period: usize,
    pub num_std: f64,
}

impl BollingerIndicator {
    pub fn new(period: usize, num_std: f64) -> Self {
        Self { period, num_std }
    }

    /// Returns `None` with fewer than `period` closes.
    pub fn compute(&self, closes: &[f64]) -> Option<Bands> {
        if self.period == 0 || closes.len() < self.period {
            return None;
        }
        let window = &closes[closes.len() - self.period..];
        let middle = window.iter().sum::<f64>() / self.period as f64;
        let variance =
            window.iter().map(|x| (x - middle).powi(2)).sum::<f64>() / self.period as f64;
        let std_dev = variance.sqrt();

        Some(Bands {
            upper: middle + self.num_std * std_dev,
            middle,
            lower: middle - self.num_std * std_dev,
        })
    }
}

impl Indicator for BollingerIndicator {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::Bollinger
    }

    fn name(&self) -> String {
        format!("BB({}, {})", self.period, self.num_std)
    }

    fn min_bars(&self) -> usize {
        self.period
    }

    fn read(&self, series: &PriceSeries) -> Result<IndicatorReading> {
        let name = self.name();
        series.require(&name, self.min_bars())?;
        let closes = series.closes();
        let price = closes[closes.len() - 1];
        let Some(bands) = self.compute(&closes) else {
            return Err(common::Error::insufficient(name, self.period, closes.len()));
        };

        // Outside the band = stretched, expect mean reversion.
        let (lean, note) = if price > bands.upper {
            (Direction::Bearish, "Price above upper Bollinger band")
        } else if price < bands.lower {
            (Direction::Bullish, "Price below lower Bollinger band")
        } else {
            (Direction::Neutral, "Price inside Bollinger bands")
        };

        let value = IndicatorValue::Bands {
            upper: bands.upper,
            middle: bands.middle,
            lower: bands.lower,
        };
        Ok(reading(self.kind(), name, value, lean, note))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::series_from_closes;

    #[test]
    fn bands_straddle_the_middle() {
        let closes: Vec<f64> = (1..=20).map(|x| x as f64).collect();
        let bands = BollingerIndicator::new(20, 2.0).compute(&closes).unwrap();
        assert!((bands.middle - 10.5).abs() < 1e-9);
        assert!(bands.upper > bands.middle);
        assert!(bands.lower < bands.middle);
        assert!(((bands.upper - bands.middle) - (bands.middle - bands.lower)).abs() < 1e-9);
    }

    #[test]
    fn insufficient_data() {
        assert!(BollingerIndicator::new(20, 2.0).compute(&[1.0, 2.0, 3.0]).is_none());
        let series = series_from_closes(&[1.0, 2.0, 3.0]);
        assert!(BollingerIndicator::new(20, 2.0)
            .read(&series)
            .unwrap_err()
            .is_insufficient_data());
    }

    #[test]
    fn spike_above_upper_band_leans_bearish() {
        let mut closes = vec![100.0; 19];
        closes.push(130.0);
        let series = series_from_closes(&closes);
        let r = BollingerIndicator::new(20, 2.0).read(&series).unwrap();
        assert_eq!(r.lean, Direction::Bearish);
    }

    #[test]
    fn crash_below_lower_band_leans_bullish() {
        let mut closes = vec![100.0; 19];
        closes.push(70.0);
        let series = series_from_closes(&closes);
        let r = BollingerIndicator::new(20, 2.0).read(&series).unwrap();
        assert_eq!(r.lean, Direction::Bullish);
    }

    #[test]
    fn flat_series_is_neutral() {
        let series = series_from_closes(&[50.0; 25]);
        let r = BollingerIndicator::new(20, 2.0).read(&series).unwrap();
        assert_eq!(r.lean, Direction::Neutral);
    }
}
