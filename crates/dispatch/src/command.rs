//! Session-command parsing.
//!
//! Recognized commands map 1:1 to registry operations; everything else is a
//! plain prompt for the assistant. Parsing is a single total function so the
//! dispatcher's branch logic stays exhaustive and testable.

use crate::error::{Error, Result};

/// A recognized session command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `new_session <name> <prompt…>` — create a named session.
    NewSession { name: String, prompt: String },
    /// `switch <name>` — make a named session active.
    Switch { name: String },
    /// `sessions` — list sessions for this chat.
    Sessions,
    /// `reset` — clear the active session pointer (non-destructive).
    Reset,
    /// `delete <name>` — remove a named session outright.
    Delete { name: String },
}

/// Outcome of parsing one message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    Command(Command),
    Prompt(String),
}

const USAGE_NEW_SESSION: &str =
    "usage: /new_session <name> <prompt> — e.g. /new_session debug Help me debug this crash";
const USAGE_SWITCH: &str = "usage: /switch <name> — see /sessions for available names";
const USAGE_DELETE: &str = "usage: /delete <name> — see /sessions for available names";
const USAGE_SESSIONS: &str = "usage: /sessions — takes no arguments";
const USAGE_RESET: &str = "usage: /reset — takes no arguments";

/// Parse a message into a session command or a plain prompt.
///
/// Slash-prefixed forms (`/switch work`) are commands; wrong arguments there
/// are a [`Error::MalformedCommand`] describing the expected syntax, and an
/// unrecognized `/word` gets a command overview rather than being sent to
/// the backend. Bare forms (`switch work`) are accepted too, but only when
/// the argument shape matches exactly — anything else stays a prompt, so
/// ordinary sentences starting with a command word are not swallowed.
pub fn parse_message(text: &str) -> Result<Parsed> {
    let trimmed = text.trim();
    let slash = trimmed.starts_with('/');
    let body = trimmed.strip_prefix('/').unwrap_or(trimmed);

    let mut words = body.split_whitespace();
    let Some(first) = words.next() else {
        return Ok(Parsed::Prompt(String::new()));
    };
    // Telegram clients append the bot's username in groups: `/switch@courier_bot`.
    let keyword = first.split('@').next().unwrap_or(first);
    let rest: Vec<&str> = words.collect();

    let parsed = match keyword {
        "new_session" => match rest.split_first() {
            Some((name, prompt)) if !prompt.is_empty() => Some(Command::NewSession {
                name: (*name).to_string(),
                prompt: prompt.join(" "),
            }),
            _ if slash => {
                return Err(Error::MalformedCommand {
                    usage: USAGE_NEW_SESSION.into(),
                });
            },
            _ => None,
        },
        "switch" => match rest.as_slice() {
            [name] => Some(Command::Switch {
                name: (*name).to_string(),
            }),
            _ if slash => {
                return Err(Error::MalformedCommand {
                    usage: USAGE_SWITCH.into(),
                });
            },
            _ => None,
        },
        "delete" => match rest.as_slice() {
            [name] => Some(Command::Delete {
                name: (*name).to_string(),
            }),
            _ if slash => {
                return Err(Error::MalformedCommand {
                    usage: USAGE_DELETE.into(),
                });
            },
            _ => None,
        },
        "sessions" if rest.is_empty() => Some(Command::Sessions),
        "sessions" if slash => {
            return Err(Error::MalformedCommand {
                usage: USAGE_SESSIONS.into(),
            });
        },
        "reset" if rest.is_empty() => Some(Command::Reset),
        "reset" if slash => {
            return Err(Error::MalformedCommand {
                usage: USAGE_RESET.into(),
            });
        },
        _ if slash => {
            return Err(Error::MalformedCommand {
                usage: format!(
                    "unknown command '/{keyword}' — available: /new_session, /switch, /sessions, /reset, /delete"
                ),
            });
        },
        _ => None,
    };

    Ok(match parsed {
        Some(cmd) => Parsed::Command(cmd),
        None => Parsed::Prompt(trimmed.to_string()),
    })
}
