use async_trait::async_trait;
use teloxide::prelude::*;

/// Исходящие текстовые сообщения в Telegram.
#[async_trait]
pub trait Outbox: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: String) -> anyhow::Result<()>;
}

#[async_trait]
impl Outbox for Bot {
    async fn send_text(&self, chat_id: ChatId, text: String) -> anyhow::Result<()> {
        self.send_message(chat_id, text).await?;
        Ok(())
    }
}
