use async_trait::async_trait;
use teloxide::prelude::*;
use tracing::debug;

use common::{AlertSink, Error, Result};

/// Delivers rendered alerts to Telegram chats.
#[derive(Clone)]
pub struct TelegramSink {
    bot: Bot,
}

impl TelegramSink {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl AlertSink for TelegramSink {
    async fn deliver(&self, destination: i64, message: &str) -> Result<()> {
        self.bot
            .send_message(ChatId(destination), message)
            .await
            .map_err(|e| Error::Delivery {
                destination,
                reason: e.to_string(),
            })?;
        debug!(chat_id = destination, "Telegram message sent");
        Ok(())
    }
}
