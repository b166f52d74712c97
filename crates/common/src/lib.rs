//! Transport-neutral types shared between the telegram glue and the
//! dispatch core.

pub mod types;

pub use types::{AudioFormat, ChatId, InboundContent, InboundMessage};
