use std::time::Duration;

use tracing::warn;

/// Process configuration loaded from environment variables at startup.
/// Missing required variables cause an immediate panic with a clear message.
#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub telegram_token: String,

    // Keep-alive HTTP endpoint
    pub keepalive_port: u16,

    // Subscriptions / scoring policy file
    pub bot_config_path: String,

    // Upper bound on a single market-data request
    pub fetch_timeout: Duration,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present. Panics on any missing required variable.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        Config {
            telegram_token: required_env("TELEGRAM_TOKEN"),
            keepalive_port: parsed_env("KEEPALIVE_PORT").unwrap_or(8080),
            bot_config_path: optional_env("BOT_CONFIG_PATH")
                .unwrap_or_else(|| "config/bot.toml".to_string()),
            fetch_timeout: Duration::from_secs(parsed_env("FETCH_TIMEOUT_SECS").unwrap_or(30)),
        }
    }
}

fn required_env(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        panic!("Required environment variable '{key}' is not set. Check your .env file.")
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn parsed_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = optional_env(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparsable environment variable, using default");
            None
        }
    }
}
