use anyhow::{anyhow, Context};
use async_trait::async_trait;
use teloxide::prelude::*;
pub use teloxide::types::{ChatId, Recipient};

use crate::Notifier;

/// Sends notifications to a single Telegram chat.
pub struct TelegramNotifier {
    bot: Bot,
    recipient: Recipient,
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("recipient", &describe_recipient(&self.recipient))
            .finish()
    }
}

impl TelegramNotifier {
    pub fn new(token: impl Into<String>, recipient: Recipient) -> Self {
        Self {
            bot: Bot::new(token),
            recipient,
        }
    }

    /// Point the bot at a different Bot API server.
    pub fn with_api_url(mut self, url: &str) -> anyhow::Result<Self> {
        let url = reqwest::Url::parse(url).with_context(|| format!("invalid Bot API url: {url}"))?;
        self.bot = self.bot.set_api_url(url);
        Ok(self)
    }

    pub fn recipient(&self) -> &Recipient {
        &self.recipient
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn channel_type(&self) -> &str {
        "telegram"
    }

    async fn deliver(&self, text: &str) -> anyhow::Result<()> {
        self.bot
            .send_message(self.recipient.clone(), text)
            .await
            .map_err(|e| {
                anyhow!(
                    "Telegram send to {} failed: {e}",
                    describe_recipient(&self.recipient)
                )
            })?;
        Ok(())
    }
}

/// Parse a chat destination: a numeric chat id (`-100123` for groups) or an `@channel` name.
pub fn parse_recipient(raw: &str) -> Option<Recipient> {
    let raw = raw.trim();
    if let Ok(id) = raw.parse::<i64>() {
        return Some(Recipient::Id(ChatId(id)));
    }
    match raw.strip_prefix('@') {
        Some(name) if !name.is_empty() && !name.contains(char::is_whitespace) => {
            Some(Recipient::ChannelUsername(raw.to_string()))
        }
        _ => None,
    }
}

pub fn describe_recipient(recipient: &Recipient) -> String {
    match recipient {
        Recipient::Id(ChatId(id)) => format!("chat:{id}"),
        Recipient::ChannelUsername(name) => name.clone(),
    }
}
