//! Assistant backend abstraction and the Claude Code CLI implementation.
//!
//! The dispatcher only sees [`BackendClient`]: one prompt in, one text
//! response plus an opaque resume handle out. The handle is the backend's
//! own conversation memory token; courier stores it verbatim and replays it
//! on the next turn of the same session.

mod claude_cli;

pub use claude_cli::ClaudeCliBackend;

use {anyhow::Result, async_trait::async_trait};

/// A single prompt to send to the backend.
#[derive(Debug, Clone, Default)]
pub struct BackendRequest {
    pub prompt: String,
    /// The session's immutable system prompt, re-supplied on every call
    /// because the CLI does not persist it across resumes.
    pub system_prompt: Option<String>,
    /// Opaque handle from a previous turn; `None` starts a fresh
    /// conversation on the backend side.
    pub resume_handle: Option<String>,
}

/// Outcome of a successful backend invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendTurn {
    pub text: String,
    /// Handle to resume this conversation, when the backend issued one.
    pub handle: Option<String>,
}

/// Assistant backend client.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Backend identifier (e.g. "claude-cli").
    fn id(&self) -> &'static str;

    /// Check whether the backend is ready to use (binary present, etc.).
    fn is_configured(&self) -> bool;

    /// Send one prompt and wait for the full response.
    async fn invoke(&self, request: BackendRequest) -> Result<BackendTurn>;
}
