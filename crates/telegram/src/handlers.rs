//! Inbound update handling: wire types in, [`InboundMessage`] out.

use {
    bytes::Bytes,
    teloxide::{
        Bot,
        prelude::*,
        types::{MediaKind, Message, MessageKind, UserId},
    },
    tracing::{debug, warn},
};

use {
    courier_common::types::{AudioFormat, InboundContent, InboundMessage},
    courier_dispatch::Dispatcher,
};

use crate::{error::Result, outbound};

/// Handle one inbound Telegram message end to end: decode it, resolve the
/// transport-level facts the dispatcher needs, and dispatch. The reply goes
/// back out through a [`outbound::BotReplySink`] while the dispatcher still
/// holds the chat's turn, keeping replies in arrival order.
pub(crate) async fn handle_message(
    msg: Message,
    bot: &Bot,
    dispatcher: &Dispatcher,
) -> Result<()> {
    let Some(sender) = msg.from.clone() else {
        debug!(chat_id = msg.chat.id.0, "ignoring message without a sender");
        return Ok(());
    };

    let Some(content) = extract_content(bot, &msg).await? else {
        debug!(chat_id = msg.chat.id.0, "ignoring non-text, non-voice message");
        return Ok(());
    };

    let mentions = match &content {
        InboundContent::Text(text) => extract_mentions(text),
        InboundContent::Voice { .. } => Vec::new(),
    };

    let sender_is_admin = sender_is_admin(bot, &msg, sender.id).await;

    let inbound = InboundMessage {
        chat_id: msg.chat.id.0,
        sender_id: i64::try_from(sender.id.0).unwrap_or(i64::MAX),
        sender_username: sender.username.clone(),
        sender_is_admin,
        mentions,
        content,
    };

    let sink = outbound::BotReplySink { bot: bot.clone() };
    dispatcher.dispatch(inbound, &sink).await;
    Ok(())
}

/// Decode the message payload into dispatcher content, downloading voice
/// audio where needed. Returns `None` for media the bot does not handle.
async fn extract_content(bot: &Bot, msg: &Message) -> Result<Option<InboundContent>> {
    let MessageKind::Common(common) = &msg.kind else {
        return Ok(None);
    };

    match &common.media_kind {
        MediaKind::Text(t) => Ok(Some(InboundContent::Text(t.text.clone()))),
        MediaKind::Voice(v) => {
            // Telegram voice notes are always OGG Opus.
            let audio = download_file(bot, &v.voice.file.id).await?;
            Ok(Some(InboundContent::Voice {
                audio,
                format: AudioFormat::Ogg,
            }))
        },
        MediaKind::Audio(a) => {
            let format = a
                .audio
                .mime_type
                .as_ref()
                .map_or(AudioFormat::Mp3, |m| AudioFormat::from_mime(m.as_ref()));
            let audio = download_file(bot, &a.audio.file.id).await?;
            Ok(Some(InboundContent::Voice { audio, format }))
        },
        _ => Ok(None),
    }
}

/// Whether the sender may drive the bot in this chat. DMs have no
/// administrators, so the peer always qualifies; in groups the sender must
/// appear in the administrator list. A failed lookup denies.
async fn sender_is_admin(bot: &Bot, msg: &Message, sender_id: UserId) -> bool {
    if msg.chat.is_private() {
        return true;
    }
    match bot.get_chat_administrators(msg.chat.id).await {
        Ok(admins) => admins.iter().any(|m| m.user.id == sender_id),
        Err(e) => {
            warn!(chat_id = msg.chat.id.0, error = %e, "admin lookup failed, denying");
            false
        },
    }
}

/// Usernames @-mentioned in the text, without the leading `@`.
///
/// A command's `@botname` suffix (`/sessions@courier_bot`) is command
/// addressing, not a mention, and is left to the command parser.
fn extract_mentions(text: &str) -> Vec<String> {
    if text.trim_start().starts_with('/') {
        return Vec::new();
    }
    text.split_whitespace()
        .filter_map(|word| word.strip_prefix('@'))
        .map(|name| name.trim_end_matches(|c: char| !c.is_alphanumeric() && c != '_'))
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}

/// Download a file from Telegram by file ID.
///
/// Telegram file URL format: `https://api.telegram.org/file/bot<token>/<path>`.
async fn download_file(bot: &Bot, file_id: &str) -> Result<Bytes> {
    let file = bot.get_file(file_id).await?;
    let url = format!(
        "https://api.telegram.org/file/bot{}/{}",
        bot.token(),
        file.path
    );

    let response = reqwest::get(&url).await?;
    if !response.status().is_success() {
        return Err(crate::error::Error::message(format!(
            "failed to download file: HTTP {}",
            response.status()
        )));
    }
    Ok(response.bytes().await?)
}
