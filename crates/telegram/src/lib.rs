//! Telegram transport for courier.
//!
//! Receives messages via long polling with the teloxide library, resolves
//! the transport-level facts the dispatcher needs (admin status, mentions,
//! voice payloads) and sends replies back, splitting where Telegram's
//! message length limit requires it.

pub mod bot;
pub mod error;
pub mod handlers;
pub mod outbound;
mod workers;

pub use {
    bot::{connect, start_polling},
    error::{Error, Result},
};
