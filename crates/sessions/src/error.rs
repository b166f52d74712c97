use {courier_common::types::ChatId, thiserror::Error};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),

    #[error("file lock failed: {message}")]
    Lock { message: String },

    #[error("stored state for chat {chat_id} is corrupt: {detail}")]
    StoreCorrupt { chat_id: ChatId, detail: String },

    #[error("a session named '{name}' already exists")]
    DuplicateName { name: String },

    #[error("no session named '{name}'")]
    UnknownSession { name: String },

    #[error("could not save sessions for chat {chat_id}: {detail}")]
    Persistence { chat_id: ChatId, detail: String },
}

impl Error {
    #[must_use]
    pub fn lock_failed(message: impl Into<String>) -> Self {
        Self::Lock {
            message: message.into(),
        }
    }

    /// True for errors the dispatcher should degrade to an empty state
    /// instead of surfacing (a corrupt record must never block the chat).
    #[must_use]
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::StoreCorrupt { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
