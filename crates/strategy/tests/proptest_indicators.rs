use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use common::{
    Direction, IndicatorKind, IndicatorReading, IndicatorValue, PriceBar, PriceSeries, Timeframe,
};
use strategy::indicators::{BollingerIndicator, EmaIndicator, RsiIndicator, SmaIndicator};
use strategy::{ConfluenceScorer, Indicator};

fn series(closes: &[f64]) -> PriceSeries {
    let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| PriceBar {
            timestamp: t0 + Duration::minutes(5 * i as i64),
            open: c,
            high: c,
            low: c,
            close: c,
            volume: 1.0,
        })
        .collect();
    PriceSeries::new("PROP", Timeframe::M5, bars).unwrap()
}

fn reading(lean: Direction, weight: f64) -> IndicatorReading {
    IndicatorReading {
        kind: IndicatorKind::Sma,
        name: "test".into(),
        value: IndicatorValue::Scalar(0.0),
        lean,
        weight,
        note: String::new(),
    }
}

proptest! {
    /// RSI stays within [0, 100] for any well-formed series.
    #[test]
    fn rsi_is_bounded(
        closes in prop::collection::vec(0.01f64..1_000_000.0f64, 2..120),
        period in 2usize..30,
    ) {
        let rsi = RsiIndicator::new(period, 70.0, 30.0);
        if let Some(v) = rsi.compute(&closes) {
            prop_assert!((0.0..=100.0).contains(&v), "RSI out of range: {}", v);
        }
    }

    /// Any series shorter than the window reports InsufficientData.
    #[test]
    fn short_series_never_yields_a_value(
        window in 2usize..60,
        seed in prop::collection::vec(1.0f64..500.0, 1..60),
    ) {
        let len = seed.len().min(window - 1).max(1);
        let s = series(&seed[..len]);
        let indicators: Vec<Box<dyn Indicator>> = vec![
            Box::new(SmaIndicator::new(window)),
            Box::new(EmaIndicator::new(window)),
            Box::new(RsiIndicator::new(window, 70.0, 30.0)),
            Box::new(BollingerIndicator::new(window, 2.0)),
        ];
        for ind in indicators {
            let err = ind.read(&s).unwrap_err();
            prop_assert!(err.is_insufficient_data(), "{}: {}", ind.name(), err);
        }
    }

    /// Adding one more agreeing indicator never lowers strength.
    #[test]
    fn strength_monotonic_in_agreeing_indicators(
        n_bull in 1usize..6,
        bear_frac in 0.0f64..1.0,
        n_neutral in 0usize..5,
        weights in prop::collection::vec(0.1f64..5.0, 16),
        extra_weight in 0.1f64..5.0,
    ) {
        let n_bear = ((n_bull as f64) * bear_frac) as usize; // always < n_bull
        let mut w = weights.into_iter();
        let mut readings = Vec::new();
        for _ in 0..n_bull { readings.push(reading(Direction::Bullish, w.next().unwrap())); }
        for _ in 0..n_bear { readings.push(reading(Direction::Bearish, w.next().unwrap())); }
        for _ in 0..n_neutral { readings.push(reading(Direction::Neutral, w.next().unwrap())); }

        let s = series(&[10.0, 11.0, 12.0]);
        let scorer = ConfluenceScorer::new(strategy::ScoringConfig {
            min_indicators: 0,
            ..Default::default()
        });

        let before = scorer.score(&s, readings.clone()).unwrap();
        prop_assert_eq!(before.direction, Direction::Bullish);

        readings.push(reading(Direction::Bullish, extra_weight));
        let after = scorer.score(&s, readings).unwrap();
        prop_assert_eq!(after.direction, Direction::Bullish);
        prop_assert!(after.strength + 1e-9 >= before.strength,
            "strength dropped: {} -> {}", before.strength, after.strength);
        prop_assert!(after.bucket >= before.bucket);
    }
}
