use std::fmt::Write;

use common::{ConfluenceSignal, Direction};

use crate::plan::{PlanConfig, TradePlan};

fn fmt_price(price: f64) -> String {
    if price.abs() < 1.0 {
        format!("{price:.6}")
    } else {
        format!("{price:.2}")
    }
}

/// Title line for an alert or a manual plan.
pub fn headline(signal: &ConfluenceSignal) -> String {
    format!("📊 {} Trade Plan ({})", signal.symbol, signal.timeframe)
}

/// Human-readable message for chat delivery.
pub fn render_signal(signal: &ConfluenceSignal, plan_cfg: &PlanConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", headline(signal));
    let _ = writeln!(out, "Price: {}", fmt_price(signal.price));
    let _ = writeln!(out);

    if signal.is_insufficient() {
        let _ = writeln!(
            out,
            "⚠️ Not enough data: only {} indicator(s) could be computed.",
            signal.indicators_computed
        );
    } else {
        let verdict = match signal.direction {
            Direction::Bullish => "✅ BUY setup",
            Direction::Bearish => "❌ SELL setup",
            Direction::Neutral => "🤝 HOLD / WAIT (no confluence yet)",
        };
        let _ = writeln!(
            out,
            "Signal: {verdict} ({}, {:.0}%)",
            signal.bucket, signal.strength
        );

        let plan = TradePlan::for_signal(signal, plan_cfg);
        let level = |v: Option<f64>| v.map(fmt_price).unwrap_or_else(|| "-".to_string());
        let _ = writeln!(out, "Entry: {}", fmt_price(signal.price));
        let _ = writeln!(out, "Stop Loss: {}", level(plan.map(|p| p.stop_loss)));
        let _ = writeln!(out, "Take Profit: {}", level(plan.map(|p| p.take_profit)));
        let _ = writeln!(out);

        let confluence = if signal.direction == Direction::Neutral || signal.factors.is_empty() {
            "No strong confluence".to_string()
        } else {
            signal
                .factors
                .iter()
                .map(|f| f.note.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        let _ = writeln!(out, "Confluence: {confluence}");
    }

    if !signal.market_open {
        let _ = writeln!(out, "⚠️ Market closed: prices may be stale.");
    }
    let _ = write!(out, "Bar: {} UTC", signal.bar_time.format("%Y-%m-%d %H:%M"));
    out
}
