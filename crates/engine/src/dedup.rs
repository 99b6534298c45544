use chrono::{DateTime, Utc};

use common::{ConfluenceSignal, Direction, StrengthBucket};

/// Last alert delivered for one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertState {
    pub direction: Direction,
    pub bucket: StrengthBucket,
    pub bar_time: DateTime<Utc>,
}

impl AlertState {
    pub fn from_signal(signal: &ConfluenceSignal) -> Self {
        Self {
            direction: signal.direction,
            bucket: signal.bucket,
            bar_time: signal.bar_time,
        }
    }

    /// Same (direction, bucket). The bar timestamp is informational only.
    pub fn matches(&self, signal: &ConfluenceSignal) -> bool {
        self.direction == signal.direction && self.bucket == signal.bucket
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Deliver,
    /// Same as the last delivered alert.
    Suppress,
    /// Low-confidence fallback signal; never delivered, never stored.
    Skip,
}

/// Whether `signal` is a new alert given the last delivered state.
///
/// With nothing delivered yet, a neutral reading has nothing to retract and
/// is suppressed; any directional reading is new.
pub fn decide(last: Option<&AlertState>, signal: &ConfluenceSignal) -> Decision {
    if signal.is_insufficient() {
        return Decision::Skip;
    }
    match last {
        Some(state) if state.matches(signal) => Decision::Suppress,
        Some(_) => Decision::Deliver,
        None if signal.direction == Direction::Neutral => Decision::Suppress,
        None => Decision::Deliver,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use common::{Confidence, Timeframe};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 5, 0, 0).unwrap()
    }

    fn signal(direction: Direction, bucket: StrengthBucket) -> ConfluenceSignal {
        ConfluenceSignal {
            symbol: "SOL-USD".into(),
            timeframe: Timeframe::M5,
            bar_time: t0() + Duration::minutes(5),
            price: 150.0,
            direction,
            strength: 55.0,
            bucket,
            confidence: Confidence::Sufficient,
            factors: vec![],
            indicators_computed: 5,
            market_open: true,
        }
    }

    fn state(direction: Direction, bucket: StrengthBucket) -> AlertState {
        AlertState { direction, bucket, bar_time: t0() }
    }

    #[test]
    fn unchanged_direction_and_bucket_is_suppressed() {
        let last = state(Direction::Bullish, StrengthBucket::Moderate);
        let s = signal(Direction::Bullish, StrengthBucket::Moderate);
        assert_eq!(decide(Some(&last), &s), Decision::Suppress);
    }

    #[test]
    fn direction_change_is_delivered() {
        let last = state(Direction::Bullish, StrengthBucket::Moderate);
        let s = signal(Direction::Bearish, StrengthBucket::Strong);
        assert_eq!(decide(Some(&last), &s), Decision::Deliver);
        let next = AlertState::from_signal(&s);
        assert_eq!(next.direction, Direction::Bearish);
        assert_eq!(next.bucket, StrengthBucket::Strong);
    }

    #[test]
    fn bucket_crossing_is_delivered() {
        let last = state(Direction::Bullish, StrengthBucket::Moderate);
        let s = signal(Direction::Bullish, StrengthBucket::Strong);
        assert_eq!(decide(Some(&last), &s), Decision::Deliver);
    }

    #[test]
    fn first_directional_signal_is_delivered() {
        let s = signal(Direction::Bearish, StrengthBucket::Weak);
        assert_eq!(decide(None, &s), Decision::Deliver);
    }

    #[test]
    fn first_neutral_signal_is_suppressed() {
        let s = signal(Direction::Neutral, StrengthBucket::Weak);
        assert_eq!(decide(None, &s), Decision::Suppress);
    }

    #[test]
    fn fading_to_neutral_is_delivered() {
        let last = state(Direction::Bullish, StrengthBucket::Strong);
        let s = signal(Direction::Neutral, StrengthBucket::Weak);
        assert_eq!(decide(Some(&last), &s), Decision::Deliver);
    }

    #[test]
    fn insufficient_data_is_skipped() {
        let mut s = signal(Direction::Neutral, StrengthBucket::Weak);
        s.confidence = Confidence::InsufficientData;
        assert_eq!(decide(None, &s), Decision::Skip);
        let last = state(Direction::Bullish, StrengthBucket::Strong);
        assert_eq!(decide(Some(&last), &s), Decision::Skip);
    }
}
