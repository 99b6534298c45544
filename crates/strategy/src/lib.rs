pub mod config;
pub mod confluence;
pub mod indicators;
pub mod plan;
pub mod registry;
pub mod render;

pub use config::{BotFileConfig, IndicatorConfig, SessionConfig};
pub use confluence::{ConfluenceScorer, ScoringConfig};
pub use plan::{PlanConfig, TradePlan};
pub use registry::IndicatorRegistry;
pub use render::render_signal;

use common::{ConfluenceSignal, IndicatorKind, IndicatorReading, PriceSeries, Result};

/// All indicator implementations must satisfy this trait.
pub trait Indicator: Send + Sync {
    fn kind(&self) -> IndicatorKind;

    /// Display name including parameters, e.g. "RSI(14)".
    fn name(&self) -> String;

    /// Bars needed before a value can be computed.
    fn min_bars(&self) -> usize;

    /// Read the latest bar of `series`.
    ///
    /// Returns `Error::InsufficientData` when the series is shorter than
    /// `min_bars()` and `Error::MalformedSeries` when it is empty.
    fn read(&self, series: &PriceSeries) -> Result<IndicatorReading>;
}

/// Indicator library + confluence scorer: series in, signal out.
pub struct SignalEngine {
    registry: IndicatorRegistry,
    scorer: ConfluenceScorer,
}

impl SignalEngine {
    pub fn new(registry: IndicatorRegistry, scorer: ConfluenceScorer) -> Self {
        Self { registry, scorer }
    }

    pub fn from_config(cfg: &BotFileConfig) -> Result<Self> {
        Ok(Self::new(
            IndicatorRegistry::from_config(&cfg.indicators)?,
            ConfluenceScorer::new(cfg.scoring.clone()),
        ))
    }

    pub fn registry(&self) -> &IndicatorRegistry {
        &self.registry
    }

    pub fn scoring(&self) -> &ScoringConfig {
        self.scorer.config()
    }

    /// Compute all indicators on `series` and score them.
    pub fn evaluate(&self, series: &PriceSeries) -> Result<ConfluenceSignal> {
        let readings = self.registry.read_all(series)?;
        self.scorer.score(series, readings)
    }
}
