use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use common::{AlertSink, Config, MarketDataSource};
use engine::{Analyzer, Scheduler, SessionGate, YahooClient};
use strategy::{BotFileConfig, SignalEngine};
use telegram_alerts::{start_bot, BotDeps, TelegramSink};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env();
    let bot_file = BotFileConfig::load(&cfg.bot_config_path)
        .with_context(|| format!("loading {}", cfg.bot_config_path))?;
    info!(
        subscriptions = bot_file.subscriptions.len(),
        indicators = bot_file.indicators.len(),
        "SigBot starting"
    );

    // ── Signal engine ─────────────────────────────────────────────────────────
    let signal_engine = SignalEngine::from_config(&bot_file).context("building indicators")?;
    let longest = signal_engine.registry().max_min_bars();
    info!(longest_window = longest, "Indicator registry ready");

    // ── Market sessions ───────────────────────────────────────────────────────
    let gate = SessionGate::new(bot_file.exchange_hours()?);
    gate.validate(&bot_file.subscriptions)
        .context("checking subscription markets")?;

    // ── Market data ───────────────────────────────────────────────────────────
    let source: Arc<dyn MarketDataSource> =
        Arc::new(YahooClient::new(cfg.fetch_timeout).context("building HTTP client")?);
    let analyzer = Arc::new(Analyzer::new(source, signal_engine, gate, cfg.fetch_timeout));

    // ── Telegram ──────────────────────────────────────────────────────────────
    let bot = teloxide::Bot::new(cfg.telegram_token.clone());
    let sink: Arc<dyn AlertSink> = Arc::new(TelegramSink::new(bot.clone()));
    let subscriptions = Arc::new(bot_file.subscriptions.clone());
    let bot_deps = BotDeps {
        analyzer: analyzer.clone(),
        plan: bot_file.plan.clone(),
        subscriptions: subscriptions.clone(),
    };

    // ── Spawn all tasks ───────────────────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler = Scheduler::new(&subscriptions, analyzer, sink, bot_file.plan.clone());
    if scheduler.is_empty() {
        warn!("No subscriptions configured; only manual /plan requests will be served");
    }
    let workers = scheduler.spawn(shutdown_rx.clone());

    let bot_task = tokio::spawn(start_bot(bot, bot_deps, shutdown_rx.clone()));

    let api_state = api::AppState::new(subscriptions.len());
    let port = cfg.keepalive_port;
    let api_rx = shutdown_rx.clone();
    let api_task = tokio::spawn(async move {
        if let Err(e) = api::serve(api_state, port, api_rx).await {
            error!(error = %e, "Keep-alive server failed");
        }
    });

    info!("All subsystems started. Waiting for shutdown signal.");
    tokio::signal::ctrl_c()
        .await
        .context("listening for Ctrl-C")?;
    info!("Shutdown signal received. Stopping workers.");
    let _ = shutdown_tx.send(true);

    for handle in workers {
        if let Err(e) = handle.await {
            warn!(error = %e, "Subscription worker ended abnormally");
        }
    }
    let _ = bot_task.await;
    let _ = api_task.await;
    info!("Shutdown complete.");
    Ok(())
}
