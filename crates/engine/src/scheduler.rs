use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use common::{AlertSink, Subscription};
use strategy::{render_signal, PlanConfig};

use crate::analyzer::Analyzer;
use crate::dedup::{decide, AlertState, Decision};

/// Where a worker is within one evaluation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Evaluating,
    Suppressed,
    Delivering,
}

/// Result of one tick, mostly for logging and tests.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    MarketClosed,
    /// Scored with too few indicators; nothing sent.
    InsufficientData,
    Suppressed,
    Delivered(AlertState),
    /// Fetch or evaluation failed; retried next tick.
    EvaluationFailed(String),
    /// Sink rejected the alert; state untouched so the next tick retries.
    DeliveryFailed(String),
}

/// Periodic evaluation loop for one subscription. Owns its dedup state.
pub struct SubscriptionWorker {
    sub: Subscription,
    analyzer: Arc<Analyzer>,
    sink: Arc<dyn AlertSink>,
    plan: PlanConfig,
    state: Option<AlertState>,
    phase: Phase,
}

impl SubscriptionWorker {
    pub fn new(
        sub: Subscription,
        analyzer: Arc<Analyzer>,
        sink: Arc<dyn AlertSink>,
        plan: PlanConfig,
    ) -> Self {
        Self {
            sub,
            analyzer,
            sink,
            plan,
            state: None,
            phase: Phase::Idle,
        }
    }

    /// Start from a previously delivered alert.
    pub fn with_state(mut self, state: Option<AlertState>) -> Self {
        self.state = state;
        self
    }

    pub fn subscription(&self) -> &Subscription {
        &self.sub
    }

    pub fn state(&self) -> Option<&AlertState> {
        self.state.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn enter(&mut self, phase: Phase) {
        debug!(sub = %self.sub, from = ?self.phase, to = ?phase, "Worker phase");
        self.phase = phase;
    }

    /// One evaluation cycle at wall-clock `now`. Always ends in `Phase::Idle`.
    pub async fn tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        let outcome = self.run_cycle(now).await;
        self.enter(Phase::Idle);
        outcome
    }

    async fn run_cycle(&mut self, now: DateTime<Utc>) -> TickOutcome {
        let market = self.sub.market.as_deref();
        if !self.analyzer.gate().is_open(&self.sub.symbol, market, now) {
            debug!(sub = %self.sub, "Market closed, skipping");
            return TickOutcome::MarketClosed;
        }

        self.enter(Phase::Evaluating);
        let signal = match self.analyzer.evaluate(&self.sub.symbol, self.sub.timeframe).await {
            Ok(signal) => signal,
            Err(e) => {
                warn!(sub = %self.sub, error = %e, "Evaluation failed");
                return TickOutcome::EvaluationFailed(e.to_string());
            }
        };

        match decide(self.state.as_ref(), &signal) {
            Decision::Skip => {
                info!(
                    sub = %self.sub,
                    computed = signal.indicators_computed,
                    "Not enough indicators computed, no alert"
                );
                TickOutcome::InsufficientData
            }
            Decision::Suppress => {
                self.enter(Phase::Suppressed);
                debug!(
                    sub = %self.sub,
                    direction = %signal.direction,
                    bucket = %signal.bucket,
                    "Unchanged, suppressed"
                );
                TickOutcome::Suppressed
            }
            Decision::Deliver => {
                self.enter(Phase::Delivering);
                let text = render_signal(&signal, &self.plan);
                match self.sink.deliver(self.sub.destination, &text).await {
                    Ok(()) => {
                        let state = AlertState::from_signal(&signal);
                        self.state = Some(state);
                        info!(
                            sub = %self.sub,
                            direction = %signal.direction,
                            bucket = %signal.bucket,
                            strength = signal.strength,
                            "Alert delivered"
                        );
                        TickOutcome::Delivered(state)
                    }
                    Err(e) => {
                        error!(sub = %self.sub, error = %e, "Alert delivery failed");
                        TickOutcome::DeliveryFailed(e.to_string())
                    }
                }
            }
        }
    }

    /// Tick every `interval_secs` until `shutdown` flips to true.
    /// The first tick fires immediately; overrunning ticks are skipped.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let period = Duration::from_secs(self.sub.interval_secs.max(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(sub = %self.sub, every = ?period, "Subscription worker started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let outcome = self.tick(Utc::now()).await;
                    debug!(sub = %self.sub, ?outcome, "Tick complete");
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!(sub = %self.sub, "Subscription worker stopped");
    }
}

/// One worker task per subscription.
pub struct Scheduler {
    workers: Vec<SubscriptionWorker>,
}

impl Scheduler {
    pub fn new(
        subscriptions: &[Subscription],
        analyzer: Arc<Analyzer>,
        sink: Arc<dyn AlertSink>,
        plan: PlanConfig,
    ) -> Self {
        let workers = subscriptions
            .iter()
            .cloned()
            .map(|sub| SubscriptionWorker::new(sub, analyzer.clone(), sink.clone(), plan.clone()))
            .collect();
        Self { workers }
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Spawn every worker. Each stops when `shutdown` is set to true.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        self.workers
            .into_iter()
            .map(|worker| tokio::spawn(worker.run(shutdown.clone())))
            .collect()
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
