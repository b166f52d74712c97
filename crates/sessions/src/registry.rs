use dashmap::DashMap;
use tracing::{debug, warn};

use courier_common::types::ChatId;

use crate::{
    error::{Error, Result},
    model::{ChatSessionState, Session, SessionSummary, now_ms},
    store::ChatStore,
};

/// In-memory authoritative view of per-chat session state, backed by a
/// [`ChatStore`].
///
/// Commit ordering is mutate-then-flush-then-acknowledge: every operation
/// mutates a working copy of the chat's state, flushes it to the store, and
/// only then installs it in memory. A flush failure therefore leaves the
/// in-memory view untouched — memory and disk never diverge.
///
/// The registry expects the dispatcher's single-active-writer discipline per
/// chat; operations on *different* chats may run concurrently.
pub struct SessionRegistry {
    store: ChatStore,
    chats: DashMap<ChatId, ChatSessionState>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new(store: ChatStore) -> Self {
        Self {
            store,
            chats: DashMap::new(),
        }
    }

    /// Current state for a chat, loading from the store on first touch.
    ///
    /// A corrupt or unreadable record degrades to an empty state with a
    /// warning; the dispatch path must never crash on bad data.
    pub async fn state(&self, chat_id: ChatId) -> ChatSessionState {
        if let Some(state) = self.chats.get(&chat_id) {
            return state.clone();
        }
        let state = match self.store.load(chat_id).await {
            Ok(Some(state)) => {
                debug!(chat_id, sessions = state.sessions.len(), "loaded chat state");
                state
            },
            Ok(None) => ChatSessionState::default(),
            Err(e) => {
                warn!(chat_id, error = %e, "falling back to empty chat state");
                ChatSessionState::default()
            },
        };
        self.chats.insert(chat_id, state.clone());
        state
    }

    /// The chat's active session, if any.
    pub async fn active_session(&self, chat_id: ChatId) -> Option<Session> {
        self.state(chat_id).await.active_session().cloned()
    }

    /// Create a named session and make it the chat's active session.
    pub async fn create(
        &self,
        chat_id: ChatId,
        name: &str,
        system_prompt: &str,
    ) -> Result<Session> {
        let mut state = self.state(chat_id).await;
        if state.sessions.contains_key(name) {
            return Err(Error::DuplicateName { name: name.into() });
        }
        let session = Session::new(name, system_prompt);
        state.sessions.insert(name.into(), session.clone());
        state.active = Some(name.into());
        self.commit(chat_id, state).await?;
        Ok(session)
    }

    /// Switch the chat's active session to an existing name.
    pub async fn switch(&self, chat_id: ChatId, name: &str) -> Result<Session> {
        let mut state = self.state(chat_id).await;
        let session = state
            .sessions
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownSession { name: name.into() })?;
        state.active = Some(name.into());
        self.commit(chat_id, state).await?;
        Ok(session)
    }

    /// Session summaries, most recently used first.
    pub async fn list(&self, chat_id: ChatId) -> Vec<SessionSummary> {
        self.state(chat_id).await.summaries()
    }

    /// Clear the active pointer. Non-destructive: every named session and
    /// its backend handle survive; plain prompts become stateless turns.
    pub async fn reset(&self, chat_id: ChatId) -> Result<()> {
        let mut state = self.state(chat_id).await;
        state.active = None;
        self.commit(chat_id, state).await
    }

    /// Delete a named session outright, clearing the active pointer if it
    /// pointed there.
    pub async fn delete(&self, chat_id: ChatId, name: &str) -> Result<()> {
        let mut state = self.state(chat_id).await;
        if state.sessions.remove(name).is_none() {
            return Err(Error::UnknownSession { name: name.into() });
        }
        if state.active.as_deref() == Some(name) {
            state.active = None;
        }
        self.commit(chat_id, state).await
    }

    /// Record a successful backend exchange for a named session: stores the
    /// new backend handle and bumps `last_used_at` strictly monotonically.
    pub async fn record_exchange(
        &self,
        chat_id: ChatId,
        name: &str,
        handle: String,
    ) -> Result<()> {
        let mut state = self.state(chat_id).await;
        let session = state
            .sessions
            .get_mut(name)
            .ok_or_else(|| Error::UnknownSession { name: name.into() })?;
        session.backend_handle = Some(handle);
        // Strictly increasing even when two exchanges land within the same
        // millisecond, so `list` ordering stays deterministic.
        session.last_used_at = now_ms().max(session.last_used_at + 1);
        self.commit(chat_id, state).await
    }

    /// Flush the working copy to the store, then install it in memory.
    async fn commit(&self, chat_id: ChatId, state: ChatSessionState) -> Result<()> {
        self.store
            .save(chat_id, &state)
            .await
            .map_err(|e| Error::Persistence {
                chat_id,
                detail: e.to_string(),
            })?;
        self.chats.insert(chat_id, state);
        Ok(())
    }
}
