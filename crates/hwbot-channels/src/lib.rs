use async_trait::async_trait;

#[cfg(feature = "telegram")]
pub mod telegram;

/// Outbound text channel for student notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn channel_type(&self) -> &str;

    async fn deliver(&self, text: &str) -> anyhow::Result<()>;
}

/// Result of a best-effort send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Failed(String),
}

impl Delivery {
    pub fn is_sent(&self) -> bool {
        matches!(self, Delivery::Sent)
    }
}

/// Send `text` through `notifier`, logging the outcome. Never returns an error.
pub async fn send_message(notifier: &dyn Notifier, text: &str) -> Delivery {
    match notifier.deliver(text).await {
        Ok(()) => {
            tracing::info!("Sent {} message \"{}\"", notifier.channel_type(), text);
            Delivery::Sent
        }
        Err(e) => {
            tracing::error!("Failed to send {} message: {e:#}", notifier.channel_type());
            Delivery::Failed(format!("{e:#}"))
        }
    }
}
