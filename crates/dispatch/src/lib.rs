//! The message-dispatch core.
//!
//! Consumes one inbound message at a time per chat: admits it through the
//! access filter, resolves voice to text, executes session commands or
//! forwards plain prompts to the assistant backend, records the resulting
//! session state, and hands the reply to the transport's sink. All failures are
//! converted to replies (or silence) here; nothing propagates far enough to
//! kill a chat's processing loop.

pub mod access;
pub mod command;
pub mod dispatcher;
pub mod error;
pub mod resolver;

pub use {
    access::{AccessDenied, AccessPolicy},
    command::{Command, Parsed, parse_message},
    dispatcher::{Dispatcher, DispatcherConfig, ReplySink},
    error::{Error, Result},
};
