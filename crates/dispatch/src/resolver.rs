//! Content resolution: turn an inbound payload into prompt text.

use tracing::debug;

use {courier_common::types::InboundContent, courier_voice::Transcriber};

use crate::error::{Error, Result};

/// Resolve an inbound payload to text.
///
/// Text passes through unchanged; voice goes through the transcriber. A
/// transcription failure is surfaced to the (already authorized) sender as
/// an error reply, never silently dropped.
pub async fn resolve_content(
    transcriber: Option<&dyn Transcriber>,
    content: InboundContent,
) -> Result<String> {
    match content {
        InboundContent::Text(text) => Ok(text),
        InboundContent::Voice { audio, format } => {
            let Some(transcriber) = transcriber else {
                return Err(Error::Transcription {
                    detail: "no transcription engine is configured".into(),
                });
            };
            let text = transcriber
                .transcribe(audio, format)
                .await
                .map_err(|e| Error::Transcription {
                    detail: e.to_string(),
                })?;
            debug!(text_len = text.len(), "voice message transcribed");
            Ok(text)
        },
    }
}
