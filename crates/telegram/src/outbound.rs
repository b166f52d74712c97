//! Outbound message delivery.

use {
    async_trait::async_trait,
    teloxide::{Bot, prelude::*, types::ChatId},
    tracing::{debug, warn},
};

use courier_dispatch::ReplySink;

use crate::error::Result;

/// Telegram rejects messages longer than this many characters.
pub const TELEGRAM_MAX_MESSAGE_LEN: usize = 4096;

/// Send `text` to a chat, splitting into multiple messages when it exceeds
/// Telegram's length limit.
pub async fn send_text(bot: &Bot, chat_id: i64, text: &str) -> Result<()> {
    let chunks = split_text(text, TELEGRAM_MAX_MESSAGE_LEN);
    debug!(chat_id, chunks = chunks.len(), "sending reply");
    for chunk in chunks {
        bot.send_message(ChatId(chat_id), chunk).await?;
    }
    Ok(())
}

/// [`ReplySink`] delivering through [`send_text`]. Send failures are logged
/// and swallowed; the dispatcher has no use for them.
pub struct BotReplySink {
    pub bot: Bot,
}

#[async_trait]
impl ReplySink for BotReplySink {
    async fn send(&self, chat_id: i64, text: &str) {
        if let Err(e) = send_text(&self.bot, chat_id, text).await {
            warn!(chat_id, error = %e, "failed to deliver reply");
        }
    }
}

/// Split `text` into chunks of at most `max` characters, preferring line
/// breaks, then word breaks, over hard cuts.
fn split_text(text: &str, max: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut rest = text;

    while rest.chars().count() > max {
        let hard_cut = rest
            .char_indices()
            .nth(max)
            .map_or(rest.len(), |(idx, _)| idx);
        let window = &rest[..hard_cut];

        let cut = window
            .rfind('\n')
            .or_else(|| window.rfind(' '))
            .filter(|&i| i > 0)
            .unwrap_or(hard_cut);

        chunks.push(rest[..cut].trim_end().to_string());
        rest = rest[cut..].trim_start();
    }

    if !rest.is_empty() || chunks.is_empty() {
        chunks.push(rest.to_string());
    }
    chunks
}
