use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use common::{
    Confidence, ConfluenceSignal, Direction, Error, IndicatorReading, PriceSeries, Result,
    StrengthBucket,
};

/// Scoring policy. Defaults: at least 3 indicators, `Weak` below 40,
/// `Moderate` from 40, `Strong` from 70.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Fewer computed indicators than this yields an insufficient-data signal.
    pub min_indicators: usize,
    pub moderate_threshold: f64,
    pub strong_threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_indicators: 3,
            moderate_threshold: 40.0,
            strong_threshold: 70.0,
        }
    }
}

impl ScoringConfig {
    pub fn bucket(&self, strength: f64) -> StrengthBucket {
        if strength >= self.strong_threshold {
            StrengthBucket::Strong
        } else if strength >= self.moderate_threshold {
            StrengthBucket::Moderate
        } else {
            StrengthBucket::Weak
        }
    }

    pub fn validate(&self) -> Result<()> {
        let ok = (0.0..=100.0).contains(&self.moderate_threshold)
            && (0.0..=100.0).contains(&self.strong_threshold)
            && self.moderate_threshold <= self.strong_threshold;
        if !ok {
            return Err(Error::Config(format!(
                "scoring thresholds must satisfy 0 <= moderate ({}) <= strong ({}) <= 100",
                self.moderate_threshold, self.strong_threshold
            )));
        }
        Ok(())
    }
}

/// Combines the readings computed on one series into a single signal.
///
/// Direction is decided by counting bullish against bearish leans (a tie is
/// neutral). Strength is the share of total indicator weight that agrees
/// with that direction, so one more agreeing indicator never lowers it.
#[derive(Debug, Clone, Default)]
pub struct ConfluenceScorer {
    config: ScoringConfig,
}

impl ConfluenceScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn score(&self, series: &PriceSeries, readings: Vec<IndicatorReading>) -> Result<ConfluenceSignal> {
        let last = series.last().ok_or_else(|| {
            Error::MalformedSeries(format!("{}: cannot score an empty series", series.symbol()))
        })?;

        let computed = readings.len();
        let mut signal = ConfluenceSignal {
            symbol: series.symbol().to_string(),
            timeframe: series.timeframe(),
            bar_time: last.timestamp,
            price: last.close,
            direction: Direction::Neutral,
            strength: 0.0,
            bucket: StrengthBucket::Weak,
            confidence: Confidence::InsufficientData,
            factors: Vec::new(),
            indicators_computed: computed,
            market_open: true,
        };

        if computed < self.config.min_indicators {
            return Ok(signal);
        }

        let bullish = readings.iter().filter(|r| r.lean == Direction::Bullish).count();
        let bearish = readings.iter().filter(|r| r.lean == Direction::Bearish).count();
        let direction = match bullish.cmp(&bearish) {
            Ordering::Greater => Direction::Bullish,
            Ordering::Less => Direction::Bearish,
            Ordering::Equal => Direction::Neutral,
        };

        let total_weight: f64 = readings.iter().map(|r| r.weight).sum();
        let mut factors: Vec<IndicatorReading> =
            readings.into_iter().filter(|r| r.lean == direction).collect();
        let agreeing_weight: f64 = factors.iter().map(|r| r.weight).sum();

        let strength = if total_weight > 0.0 {
            (agreeing_weight / total_weight * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };

        // Stable: equal weights keep indicator order.
        factors.sort_by(|a, b| b.weight.total_cmp(&a.weight));

        signal.direction = direction;
        signal.strength = strength;
        signal.bucket = self.config.bucket(strength);
        signal.confidence = Confidence::Sufficient;
        signal.factors = factors;
        Ok(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::series_from_closes;
    use common::{IndicatorKind, IndicatorValue};

    fn r(kind: IndicatorKind, lean: Direction, weight: f64) -> IndicatorReading {
        IndicatorReading {
            kind,
            name: kind.to_string(),
            value: IndicatorValue::Scalar(0.0),
            lean,
            weight,
            note: String::new(),
        }
    }

    fn series() -> PriceSeries {
        series_from_closes(&[1.0, 2.0, 3.0])
    }

    #[test]
    fn majority_sets_direction_and_strength() {
        let readings = vec![
            r(IndicatorKind::Ema, Direction::Bullish, 1.0),
            r(IndicatorKind::Sma, Direction::Bullish, 1.0),
            r(IndicatorKind::Rsi, Direction::Bearish, 1.0),
            r(IndicatorKind::Bollinger, Direction::Neutral, 1.0),
        ];
        let s = ConfluenceScorer::default().score(&series(), readings).unwrap();
        assert_eq!(s.direction, Direction::Bullish);
        assert!((s.strength - 50.0).abs() < 1e-9);
        assert_eq!(s.bucket, StrengthBucket::Moderate);
        assert_eq!(s.confidence, Confidence::Sufficient);
        assert_eq!(s.factors.len(), 2);
        assert_eq!(s.price, 3.0);
    }

    #[test]
    fn tie_is_neutral() {
        let readings = vec![
            r(IndicatorKind::Ema, Direction::Bullish, 3.0),
            r(IndicatorKind::Rsi, Direction::Bearish, 1.0),
            r(IndicatorKind::Bollinger, Direction::Neutral, 1.0),
        ];
        let s = ConfluenceScorer::default().score(&series(), readings).unwrap();
        assert_eq!(s.direction, Direction::Neutral);
        assert_eq!(s.confidence, Confidence::Sufficient);
        assert!(s.factors.iter().all(|f| f.lean == Direction::Neutral));
    }

    #[test]
    fn weights_drive_strength() {
        let readings = vec![
            r(IndicatorKind::Ema, Direction::Bearish, 3.0),
            r(IndicatorKind::Sma, Direction::Bearish, 1.0),
            r(IndicatorKind::Rsi, Direction::Neutral, 1.0),
        ];
        let s = ConfluenceScorer::default().score(&series(), readings).unwrap();
        assert_eq!(s.direction, Direction::Bearish);
        assert!((s.strength - 80.0).abs() < 1e-9);
        assert_eq!(s.bucket, StrengthBucket::Strong);
    }

    #[test]
    fn factors_ordered_by_weight_descending() {
        let readings = vec![
            r(IndicatorKind::Ema, Direction::Bullish, 0.5),
            r(IndicatorKind::Fibonacci, Direction::Bullish, 2.0),
            r(IndicatorKind::Sma, Direction::Bullish, 1.0),
        ];
        let s = ConfluenceScorer::default().score(&series(), readings).unwrap();
        let kinds: Vec<_> = s.factors.iter().map(|f| f.kind).collect();
        assert_eq!(
            kinds,
            vec![IndicatorKind::Fibonacci, IndicatorKind::Sma, IndicatorKind::Ema]
        );
    }

    #[test]
    fn too_few_indicators_is_flagged_not_neutral() {
        let readings = vec![
            r(IndicatorKind::Ema, Direction::Bullish, 1.0),
            r(IndicatorKind::Sma, Direction::Bullish, 1.0),
        ];
        let s = ConfluenceScorer::default().score(&series(), readings).unwrap();
        assert_eq!(s.direction, Direction::Neutral);
        assert_eq!(s.strength, 0.0);
        assert!(s.is_insufficient());
        assert_eq!(s.indicators_computed, 2);
    }

    #[test]
    fn empty_series_is_an_error() {
        let empty = PriceSeries::new("X", common::Timeframe::D1, vec![]).unwrap();
        let err = ConfluenceScorer::default().score(&empty, vec![]).unwrap_err();
        assert!(matches!(err, Error::MalformedSeries(_)));
    }

    #[test]
    fn buckets_use_thresholds() {
        let cfg = ScoringConfig::default();
        assert_eq!(cfg.bucket(0.0), StrengthBucket::Weak);
        assert_eq!(cfg.bucket(39.99), StrengthBucket::Weak);
        assert_eq!(cfg.bucket(40.0), StrengthBucket::Moderate);
        assert_eq!(cfg.bucket(69.9), StrengthBucket::Moderate);
        assert_eq!(cfg.bucket(70.0), StrengthBucket::Strong);
        assert_eq!(cfg.bucket(100.0), StrengthBucket::Strong);
    }

    #[test]
    fn inverted_thresholds_rejected() {
        let cfg = ScoringConfig {
            moderate_threshold: 80.0,
            strong_threshold: 50.0,
            ..ScoringConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
