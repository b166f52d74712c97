use thiserror::Error;

/// Failures the dispatcher converts into a single-line error reply.
///
/// Access-filter rejections are deliberately not here: they are silent and
/// never produce a reply (see [`crate::access`]).
#[derive(Debug, Error)]
pub enum Error {
    #[error("couldn't transcribe that voice message: {detail}")]
    Transcription { detail: String },

    #[error("{usage}")]
    MalformedCommand { usage: String },

    #[error("the assistant backend failed: {detail}")]
    Backend { detail: String },

    #[error("the assistant backend did not answer within {secs}s")]
    BackendTimeout { secs: u64 },

    #[error("still working on a previous message in this chat, try again shortly")]
    ChatBusy,

    #[error(transparent)]
    Session(#[from] courier_sessions::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
