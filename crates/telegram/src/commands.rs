use std::sync::Arc;

use chrono::Utc;
use teloxide::{dispatching::UpdateHandler, prelude::*, utils::command::BotCommands};
use tokio::sync::watch;
use tracing::{info, warn};

use common::{Subscription, Timeframe};
use engine::Analyzer;
use strategy::{render_signal, PlanConfig};

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Dependencies injected into every handler via `dptree`.
#[derive(Clone)]
pub struct BotDeps {
    pub analyzer: Arc<Analyzer>,
    pub plan: PlanConfig,
    pub subscriptions: Arc<Vec<Subscription>>,
}

/// Telegram bot commands.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "SigBot commands:")]
pub enum Command {
    #[command(description = "Show this help")]
    Help,
    #[command(description = "Live trade plan: /plan SYMBOL [TIMEFRAME], e.g. /plan TCS.NS 1h")]
    Plan(String),
    #[command(description = "List scheduled alert subscriptions")]
    Subscriptions,
}

/// Run the bot in long-polling mode until `shutdown` flips to true.
pub async fn start_bot(bot: Bot, deps: BotDeps, mut shutdown: watch::Receiver<bool>) {
    let deps = Arc::new(deps);

    info!("Telegram bot starting (long-polling)");

    let mut dispatcher = Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![deps])
        .build();

    let token = dispatcher.shutdown_token();
    tokio::spawn(async move {
        while shutdown.changed().await.is_ok() {
            if *shutdown.borrow() {
                break;
            }
        }
        if let Ok(done) = token.shutdown() {
            done.await;
        }
    });

    dispatcher.dispatch().await;
    info!("Telegram bot stopped");
}

fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync>> {
    use dptree::case;

    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Help].endpoint(handle_help))
        .branch(case![Command::Plan(args)].endpoint(handle_plan))
        .branch(case![Command::Subscriptions].endpoint(handle_subscriptions));

    Update::filter_message().branch(command_handler)
}

async fn handle_help(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, Command::descriptions().to_string())
        .await?;
    Ok(())
}

async fn handle_plan(bot: Bot, msg: Message, args: String, deps: Arc<BotDeps>) -> HandlerResult {
    let (symbol, timeframe) = match parse_plan_args(&args) {
        Ok(parsed) => parsed,
        Err(usage) => {
            bot.send_message(msg.chat.id, usage).await?;
            return Ok(());
        }
    };

    // A subscribed symbol keeps its configured market override.
    let market = deps
        .subscriptions
        .iter()
        .find(|s| s.symbol.eq_ignore_ascii_case(&symbol))
        .and_then(|s| s.market.as_deref());

    info!(chat_id = msg.chat.id.0, %symbol, %timeframe, "Manual plan requested");
    let text = match deps.analyzer.manual(&symbol, timeframe, market, Utc::now()).await {
        Ok(signal) => render_signal(&signal, &deps.plan),
        Err(e) => {
            warn!(%symbol, error = %e, "Manual plan failed");
            format!("❌ Error analyzing {symbol}: {e}")
        }
    };
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

async fn handle_subscriptions(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    bot.send_message(msg.chat.id, format_subscriptions(&deps.subscriptions))
        .await?;
    Ok(())
}

/// `"SYMBOL [TIMEFRAME]"` → upper-cased symbol and timeframe (default 1d).
pub fn parse_plan_args(args: &str) -> Result<(String, Timeframe), String> {
    const USAGE: &str = "Usage: /plan SYMBOL [TIMEFRAME], e.g. /plan BHARATFORG.NS 1h";

    let mut parts = args.split_whitespace();
    let symbol = parts.next().ok_or_else(|| USAGE.to_string())?;
    let timeframe = match parts.next() {
        Some(tf) => tf
            .parse::<Timeframe>()
            .map_err(|_| format!("Unknown timeframe '{tf}'. Use 1m, 5m, 15m, 30m, 1h, 1d or 1wk."))?,
        None => Timeframe::default(),
    };
    if parts.next().is_some() {
        return Err(USAGE.to_string());
    }
    Ok((symbol.to_uppercase(), timeframe))
}

pub fn format_subscriptions(subs: &[Subscription]) -> String {
    if subs.is_empty() {
        return "No subscriptions configured.".to_string();
    }
    let mut lines = vec![format!("{} subscription(s):", subs.len())];
    for sub in subs {
        lines.push(format!(
            "• {} every {}s → chat {}{}",
            sub,
            sub.interval_secs,
            sub.destination,
            sub.market
                .as_deref()
                .map(|m| format!(" [{m}]"))
                .unwrap_or_default()
        ));
    }
    lines.join("\n")
}

// ─── Tests ────────────────────────────────────────────────────────────────────
