//! The per-message pipeline and its per-chat serialization.

use std::{sync::Arc, time::Duration};

use {
    async_trait::async_trait,
    dashmap::DashMap,
    tokio::{sync::Mutex, time::timeout},
    tracing::{debug, info, warn},
};

use {
    courier_backend::{BackendClient, BackendRequest},
    courier_common::types::{ChatId, InboundMessage},
    courier_sessions::{SessionRegistry, SessionSummary},
    courier_voice::Transcriber,
};

use crate::{
    access::{self, AccessPolicy},
    command::{Command, Parsed, parse_message},
    error::{Error, Result},
    resolver::resolve_content,
};

/// Dispatcher tuning knobs.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub policy: AccessPolicy,
    /// Upper bound on one backend invocation; a timeout counts as a backend
    /// failure and never leaves the chat locked.
    pub backend_timeout: Duration,
    /// Upper bound on waiting for the chat's pipeline slot.
    pub lock_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            policy: AccessPolicy::default(),
            backend_timeout: Duration::from_secs(300),
            lock_timeout: Duration::from_secs(30),
        }
    }
}

/// Where finished replies go. The transport hands the dispatcher a sink so
/// the reply can be delivered while the chat's pipeline slot is still held.
#[async_trait]
pub trait ReplySink: Send + Sync {
    /// Deliver one reply. Delivery failures are the sink's to log; the
    /// dispatcher has nothing useful to do with them.
    async fn send(&self, chat_id: ChatId, text: &str);
}

/// Orchestration core: admit, resolve, execute, persist, reply.
///
/// Messages for the same chat are serialized through a per-chat mutex, and
/// the reply goes out through the sink before the mutex is released, so a
/// caller that feeds same-chat messages in arrival order gets the replies
/// back in that order. Different chats share no mutable state and proceed
/// concurrently.
pub struct Dispatcher {
    registry: Arc<SessionRegistry>,
    backend: Arc<dyn BackendClient>,
    transcriber: Option<Arc<dyn Transcriber>>,
    config: DispatcherConfig,
    chat_locks: DashMap<ChatId, Arc<Mutex<()>>>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        registry: Arc<SessionRegistry>,
        backend: Arc<dyn BackendClient>,
        transcriber: Option<Arc<dyn Transcriber>>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            registry,
            backend,
            transcriber,
            config,
            chat_locks: DashMap::new(),
        }
    }

    /// Process one inbound message to completion and deliver the reply.
    ///
    /// Messages rejected by the access filter are dropped silently; every
    /// failure past that point becomes a reply through `sink`, so nothing
    /// escapes to the caller's loop. The reply is handed to the sink before
    /// the chat's pipeline slot is released, which means a message queued
    /// behind this one cannot overtake its reply.
    pub async fn dispatch(&self, msg: InboundMessage, sink: &dyn ReplySink) {
        if let Err(reason) = access::admit(&self.config.policy, &msg) {
            debug!(
                chat_id = msg.chat_id,
                sender_id = msg.sender_id,
                %reason,
                "message dropped by access filter"
            );
            return;
        }

        let chat_id = msg.chat_id;
        let lock = self.chat_lock(chat_id);
        let guard = match timeout(self.config.lock_timeout, lock.lock()).await {
            Ok(guard) => guard,
            Err(_) => {
                warn!(chat_id, "chat pipeline busy past lock timeout");
                sink.send(chat_id, &error_reply(&Error::ChatBusy)).await;
                return;
            },
        };

        match self.process(msg).await {
            Ok(reply) => sink.send(chat_id, &reply).await,
            Err(e) => {
                warn!(chat_id, error = %e, "dispatch failed");
                sink.send(chat_id, &error_reply(&e)).await;
            },
        }
        drop(guard);
    }

    async fn process(&self, msg: InboundMessage) -> Result<String> {
        let chat_id = msg.chat_id;
        let text = resolve_content(self.transcriber.as_deref(), msg.content).await?;

        match parse_message(&text)? {
            Parsed::Command(cmd) => self.run_command(chat_id, cmd).await,
            Parsed::Prompt(prompt) if prompt.is_empty() => Ok(HELP.to_string()),
            Parsed::Prompt(prompt) => self.run_prompt(chat_id, prompt).await,
        }
    }

    async fn run_command(&self, chat_id: ChatId, cmd: Command) -> Result<String> {
        match cmd {
            Command::NewSession { name, prompt } => {
                let session = self.registry.create(chat_id, &name, &prompt).await?;
                info!(chat_id, name = %session.name, "session created");
                Ok(format!("🆕 Started session '{name}' — it is now active."))
            },
            Command::Switch { name } => {
                self.registry.switch(chat_id, &name).await?;
                Ok(format!("🔀 Switched to session '{name}'."))
            },
            Command::Sessions => Ok(format_session_list(&self.registry.list(chat_id).await)),
            Command::Reset => {
                self.registry.reset(chat_id).await?;
                Ok("🔄 Active session cleared. Prompts now run without a session.".to_string())
            },
            Command::Delete { name } => {
                self.registry.delete(chat_id, &name).await?;
                info!(chat_id, name = %name, "session deleted");
                Ok(format!("🗑 Deleted session '{name}'."))
            },
        }
    }

    async fn run_prompt(&self, chat_id: ChatId, prompt: String) -> Result<String> {
        let active = self.registry.active_session(chat_id).await;

        let request = BackendRequest {
            prompt,
            system_prompt: active.as_ref().map(|s| s.system_prompt.clone()),
            resume_handle: active.as_ref().and_then(|s| s.backend_handle.clone()),
        };

        let turn = match timeout(self.config.backend_timeout, self.backend.invoke(request)).await {
            Err(_) => {
                return Err(Error::BackendTimeout {
                    secs: self.config.backend_timeout.as_secs(),
                });
            },
            Ok(Err(e)) => {
                return Err(Error::Backend {
                    detail: e.to_string(),
                });
            },
            Ok(Ok(turn)) => turn,
        };

        // Only a successful turn is recorded; a failed one above left the
        // session untouched so the same prompt can simply be retried.
        if let (Some(session), Some(handle)) = (active.as_ref(), turn.handle.clone()) {
            self.registry
                .record_exchange(chat_id, &session.name, handle)
                .await?;
        }

        Ok(match active {
            Some(session) => format!("📌 {}\n\n{}", session.name, turn.text),
            None => turn.text,
        })
    }

    fn chat_lock(&self, chat_id: ChatId) -> Arc<Mutex<()>> {
        self.chat_locks.entry(chat_id).or_default().clone()
    }
}

fn error_reply(e: &Error) -> String {
    format!("⚠️ {e}")
}

const HELP: &str = "Send a prompt, a voice message, or one of: \
/new_session <name> <prompt>, /switch <name>, /sessions, /reset, /delete <name>";

fn format_session_list(sessions: &[SessionSummary]) -> String {
    if sessions.is_empty() {
        return "No sessions yet. Use /new_session <name> <prompt> to create one.".to_string();
    }
    let mut lines = vec!["📋 Sessions (most recent first):".to_string()];
    for s in sessions {
        let marker = if s.active { "→" } else { " " };
        let state = if s.has_handle { "" } else { " (unused)" };
        lines.push(format!("{marker} {}{state}", s.name));
    }
    lines.join("\n")
}
