//! Transport-neutral message types exchanged between the telegram glue and
//! the dispatch core.

use {bytes::Bytes, serde::{Deserialize, Serialize}};

/// Telegram chat identifier. Negative for groups, positive for DMs.
pub type ChatId = i64;

/// Audio container format for voice payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// Telegram voice notes (OGG Opus).
    Ogg,
    Mp3,
    M4a,
    Wav,
}

impl AudioFormat {
    /// File extension without the leading dot.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Ogg => "ogg",
            Self::Mp3 => "mp3",
            Self::M4a => "m4a",
            Self::Wav => "wav",
        }
    }

    /// Map a MIME type to a format, defaulting to MP3 for unknown audio.
    #[must_use]
    pub fn from_mime(mime: &str) -> Self {
        match mime {
            "audio/ogg" | "audio/opus" => Self::Ogg,
            "audio/mp4" | "audio/m4a" | "audio/x-m4a" => Self::M4a,
            "audio/wav" | "audio/x-wav" => Self::Wav,
            _ => Self::Mp3,
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Payload of an inbound message after transport decoding.
#[derive(Debug, Clone)]
pub enum InboundContent {
    Text(String),
    Voice { audio: Bytes, format: AudioFormat },
}

/// A single inbound chat message, decoupled from the transport's wire types.
///
/// The transport layer resolves everything that requires a Telegram API call
/// (admin status, mention list) before handing the message to the dispatcher,
/// so the dispatch core stays a pure state machine over this struct.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub chat_id: ChatId,
    pub sender_id: i64,
    pub sender_username: Option<String>,
    /// Whether the sender is an administrator of the chat (or the peer in a
    /// DM, where there is nothing to administrate).
    pub sender_is_admin: bool,
    /// Usernames @-mentioned in the message, without the leading `@`.
    pub mentions: Vec<String>,
    pub content: InboundContent,
}
