use serde::{Deserialize, Serialize};

use common::{ConfluenceSignal, Direction, Error, Result};

/// Stop-loss / take-profit distances used when rendering a trade plan.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PlanConfig {
    /// Distance of the stop from entry (e.g. 0.02 = 2%).
    pub stop_loss_pct: f64,
    /// Distance of the target from entry (e.g. 0.04 = 4%).
    pub take_profit_pct: f64,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            stop_loss_pct: 0.02,
            take_profit_pct: 0.04,
        }
    }
}

impl PlanConfig {
    pub fn validate(&self) -> Result<()> {
        let ok = |v: f64| v.is_finite() && (0.0..1.0).contains(&v);
        if !ok(self.stop_loss_pct) || !ok(self.take_profit_pct) {
            return Err(Error::Config(format!(
                "plan percentages must be in [0, 1): stop_loss_pct={}, take_profit_pct={}",
                self.stop_loss_pct, self.take_profit_pct
            )));
        }
        Ok(())
    }
}

/// Entry, stop and target levels suggested for a directional signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradePlan {
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

impl TradePlan {
    /// `None` for neutral or insufficient-data signals.
    pub fn for_signal(signal: &ConfluenceSignal, cfg: &PlanConfig) -> Option<Self> {
        if signal.is_insufficient() {
            return None;
        }
        let entry = signal.price;
        match signal.direction {
            Direction::Bullish => Some(Self {
                entry,
                stop_loss: entry * (1.0 - cfg.stop_loss_pct),
                take_profit: entry * (1.0 + cfg.take_profit_pct),
            }),
            Direction::Bearish => Some(Self {
                entry,
                stop_loss: entry * (1.0 + cfg.stop_loss_pct),
                take_profit: entry * (1.0 - cfg.take_profit_pct),
            }),
            Direction::Neutral => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::{Confidence, StrengthBucket, Timeframe};

    fn signal(direction: Direction, confidence: Confidence) -> ConfluenceSignal {
        ConfluenceSignal {
            symbol: "SOL-USD".into(),
            timeframe: Timeframe::M5,
            bar_time: Utc::now(),
            price: 100.0,
            direction,
            strength: 75.0,
            bucket: StrengthBucket::Strong,
            confidence,
            factors: vec![],
            indicators_computed: 5,
            market_open: true,
        }
    }

    #[test]
    fn long_plan_brackets_entry() {
        let plan = TradePlan::for_signal(
            &signal(Direction::Bullish, Confidence::Sufficient),
            &PlanConfig::default(),
        )
        .unwrap();
        assert!((plan.stop_loss - 98.0).abs() < 1e-9);
        assert!((plan.take_profit - 104.0).abs() < 1e-9);
    }

    #[test]
    fn short_plan_is_mirrored() {
        let plan = TradePlan::for_signal(
            &signal(Direction::Bearish, Confidence::Sufficient),
            &PlanConfig::default(),
        )
        .unwrap();
        assert!((plan.stop_loss - 102.0).abs() < 1e-9);
        assert!((plan.take_profit - 96.0).abs() < 1e-9);
    }

    #[test]
    fn no_plan_without_direction() {
        let cfg = PlanConfig::default();
        assert!(TradePlan::for_signal(&signal(Direction::Neutral, Confidence::Sufficient), &cfg).is_none());
        assert!(
            TradePlan::for_signal(&signal(Direction::Bullish, Confidence::InsufficientData), &cfg)
                .is_none()
        );
    }
}
