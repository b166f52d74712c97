//! Named, persistent conversation sessions.
//!
//! Each chat owns a set of named sessions plus an optional active pointer,
//! stored as one JSON record per chat at `<data_dir>/chats/<chatId>.json`
//! with file locking for concurrent access. The in-memory registry is
//! write-through: every mutation is flushed to disk before it is visible
//! in memory.

pub mod error;
pub mod model;
pub mod registry;
pub mod store;

pub use {
    error::{Error, Result},
    model::{ChatSessionState, Session, SessionSummary},
    registry::SessionRegistry,
    store::ChatStore,
};
