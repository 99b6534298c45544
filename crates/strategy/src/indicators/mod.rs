pub mod bollinger;
pub mod crossover;
pub mod fibonacci;
pub mod moving_average;
pub mod rsi;

pub use bollinger::BollingerIndicator;
pub use crossover::{EmaTrendIndicator, SmaCrossIndicator};
pub use fibonacci::FibonacciIndicator;
pub use moving_average::{ema, sma, EmaIndicator, SmaIndicator};
pub use rsi::RsiIndicator;

use common::{Direction, IndicatorKind, IndicatorReading, IndicatorValue};

/// Build a reading with the default weight; the registry applies configured
/// weights afterwards.
pub(crate) fn reading(
    kind: IndicatorKind,
    name: String,
    value: IndicatorValue,
    lean: Direction,
    note: impl Into<String>,
) -> IndicatorReading {
    IndicatorReading {
        kind,
        name,
        value,
        lean,
        weight: 1.0,
        note: note.into(),
    }
}
