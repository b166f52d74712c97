//! Access filter: decides whether an inbound message is processed at all.
//!
//! Rejections are silent by design — no reply, no session mutation — so the
//! bot's presence and behavior are never confirmed to unauthorized senders.

use courier_common::types::{ChatId, InboundMessage};

/// Static access policy, from configuration.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    /// Chat ids the bot serves. Empty means any chat.
    pub allowed_chats: Vec<ChatId>,
    /// The bot's own username, used to tell "addressed to me" mentions
    /// apart from messages meant for someone else.
    pub bot_username: Option<String>,
}

/// Determine if an inbound message should be processed.
///
/// Rules, applied in order:
/// 1. the chat must be on the allowlist (when one is configured);
/// 2. the sender must be an administrator of the chat;
/// 3. the message must not @-mention a participant other than the bot.
///
/// Returns `Ok(())` if the message is allowed, or `Err(reason)` if it should
/// be silently dropped.
pub fn admit(policy: &AccessPolicy, msg: &InboundMessage) -> Result<(), AccessDenied> {
    if !policy.allowed_chats.is_empty() && !policy.allowed_chats.contains(&msg.chat_id) {
        return Err(AccessDenied::ChatNotAllowed);
    }

    if !msg.sender_is_admin {
        return Err(AccessDenied::NotAdmin);
    }

    let bot = policy.bot_username.as_deref().unwrap_or_default();
    let addressed_elsewhere = msg
        .mentions
        .iter()
        .any(|m| !m.eq_ignore_ascii_case(bot));
    if addressed_elsewhere {
        return Err(AccessDenied::AddressedElsewhere);
    }

    Ok(())
}

/// Reason an inbound message was denied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDenied {
    ChatNotAllowed,
    NotAdmin,
    AddressedElsewhere,
}

impl std::fmt::Display for AccessDenied {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ChatNotAllowed => write!(f, "chat not on allowlist"),
            Self::NotAdmin => write!(f, "sender is not a chat administrator"),
            Self::AddressedElsewhere => write!(f, "message addressed to another participant"),
        }
    }
}
