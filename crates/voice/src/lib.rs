//! Voice transcription adapter.
//!
//! Converts a voice-audio payload into text via a local whisper.cpp CLI.
//! The dispatcher only sees the [`Transcriber`] trait; audio decoding and
//! format handling are the engine's concern.

mod cli_utils;
mod whisper_cli;

pub use whisper_cli::WhisperCliTranscriber;

use {anyhow::Result, async_trait::async_trait, bytes::Bytes};

use courier_common::types::AudioFormat;

/// Speech-to-text engine.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Engine identifier (e.g. "whisper-cli").
    fn id(&self) -> &'static str;

    /// Check if the engine is configured and ready.
    fn is_configured(&self) -> bool;

    /// Transcribe raw audio to UTF-8 text.
    async fn transcribe(&self, audio: Bytes, format: AudioFormat) -> Result<String>;
}
