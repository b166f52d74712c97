use std::{
    collections::HashMap,
    time::{SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};

/// Current unix time in milliseconds.
pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// A named conversation context within a chat.
///
/// `name` and `system_prompt` are immutable after creation. `backend_handle`
/// is an opaque token owned by the assistant backend; courier stores and
/// replays it but never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub name: String,
    pub system_prompt: String,
    #[serde(default)]
    pub backend_handle: Option<String>,
    pub created_at: u64,
    pub last_used_at: u64,
}

impl Session {
    #[must_use]
    pub fn new(name: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        let now = now_ms();
        Self {
            name: name.into(),
            system_prompt: system_prompt.into(),
            backend_handle: None,
            created_at: now,
            last_used_at: now,
        }
    }
}

/// All session state for a single chat: the named sessions plus the active
/// pointer. The struct is never deleted, only emptied.
///
/// Unknown fields in the stored record are ignored on load so newer releases
/// can extend the format without breaking older data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSessionState {
    pub sessions: HashMap<String, Session>,
    pub active: Option<String>,
}

impl ChatSessionState {
    /// The active session, if the active pointer is set.
    ///
    /// The pointer is kept consistent by the registry (it always names an
    /// existing session), but a hand-edited record may violate that, so the
    /// lookup is still fallible.
    #[must_use]
    pub fn active_session(&self) -> Option<&Session> {
        self.active.as_deref().and_then(|n| self.sessions.get(n))
    }

    /// Session summaries ordered by `last_used_at` descending (most recently
    /// used first), name ascending as a tie-break for determinism.
    #[must_use]
    pub fn summaries(&self) -> Vec<SessionSummary> {
        let mut out: Vec<SessionSummary> = self
            .sessions
            .values()
            .map(|s| SessionSummary {
                name: s.name.clone(),
                active: self.active.as_deref() == Some(s.name.as_str()),
                created_at: s.created_at,
                last_used_at: s.last_used_at,
                has_handle: s.backend_handle.is_some(),
            })
            .collect();
        out.sort_by(|a, b| {
            b.last_used_at
                .cmp(&a.last_used_at)
                .then_with(|| a.name.cmp(&b.name))
        });
        out
    }
}

/// Listing view of a session, without the prompt or the backend handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub name: String,
    pub active: bool,
    pub created_at: u64,
    pub last_used_at: u64,
    /// Whether the session has completed at least one backend exchange.
    pub has_handle: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(names: &[(&str, u64)]) -> ChatSessionState {
        let mut state = ChatSessionState::default();
        for (name, used) in names {
            let mut s = Session::new(*name, "prompt");
            s.last_used_at = *used;
            state.sessions.insert((*name).to_string(), s);
        }
        state
    }

    #[test]
    fn summaries_sorted_most_recent_first() {
        let mut state = state_with(&[("work", 100), ("play", 300), ("idle", 200)]);
        state.active = Some("work".into());

        let list = state.summaries();
        let names: Vec<&str> = list.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["play", "idle", "work"]);
        assert!(list[2].active);
        assert!(!list[0].active);
    }

    #[test]
    fn summaries_tie_break_by_name() {
        let state = state_with(&[("b", 100), ("a", 100)]);
        let summaries = state.summaries();
        let names: Vec<&str> = summaries.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn active_session_lookup() {
        let mut state = state_with(&[("work", 1)]);
        assert!(state.active_session().is_none());
        state.active = Some("work".into());
        assert_eq!(state.active_session().map(|s| s.name.as_str()), Some("work"));
        // A dangling pointer does not panic.
        state.active = Some("gone".into());
        assert!(state.active_session().is_none());
    }

    #[test]
    fn unknown_fields_ignored_on_load() {
        let json = r#"{
            "sessions": {
                "work": {
                    "name": "work",
                    "system_prompt": "be helpful",
                    "backend_handle": "h1",
                    "created_at": 1,
                    "last_used_at": 2,
                    "color": "teal"
                }
            },
            "active": "work",
            "schema_version": 9
        }"#;
        let state: ChatSessionState = serde_json::from_str(json).unwrap();
        assert_eq!(state.active.as_deref(), Some("work"));
        assert_eq!(
            state.sessions["work"].backend_handle.as_deref(),
            Some("h1")
        );
    }
}
