//! whisper-cli (whisper.cpp) transcription engine.
//!
//! whisper.cpp is a port of OpenAI's Whisper model to C/C++, offering
//! fast local inference on CPU or GPU. This engine wraps the CLI tool.
//!
//! Installation:
//! - macOS: `brew install whisper-cpp`
//! - From source: https://github.com/ggerganov/whisper.cpp

use std::process::Stdio;

use {
    anyhow::{Context, Result, anyhow},
    async_trait::async_trait,
    bytes::Bytes,
    serde::Deserialize,
    tokio::process::Command,
    tracing::debug,
};

use courier_common::types::AudioFormat;

use crate::{Transcriber, cli_utils};

/// Binary name for whisper.cpp CLI.
const BINARY_NAME: &str = "whisper-cli";

/// Alternative binary name (some installations use this).
const ALT_BINARY_NAME: &str = "whisper";

/// whisper-cli (whisper.cpp) transcription engine.
#[derive(Clone, Debug, Default)]
pub struct WhisperCliTranscriber {
    binary_path: Option<String>,
    model_path: Option<String>,
    language: Option<String>,
}

impl WhisperCliTranscriber {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_options(
        binary_path: Option<String>,
        model_path: Option<String>,
        language: Option<String>,
    ) -> Self {
        Self {
            binary_path,
            model_path,
            language,
        }
    }

    fn find_binary(&self) -> Option<std::path::PathBuf> {
        cli_utils::find_binary(BINARY_NAME, self.binary_path.as_deref())
            .or_else(|| cli_utils::find_binary(ALT_BINARY_NAME, None))
    }

    fn get_model_path(&self) -> Result<std::path::PathBuf> {
        self.model_path
            .as_ref()
            .map(|p| cli_utils::expand_tilde(p))
            .filter(|p| p.exists())
            .ok_or_else(|| anyhow!("whisper-cli model path not configured or file not found"))
    }
}

#[async_trait]
impl Transcriber for WhisperCliTranscriber {
    fn id(&self) -> &'static str {
        "whisper-cli"
    }

    fn is_configured(&self) -> bool {
        // Need both binary and model to be configured.
        self.find_binary().is_some()
            && self
                .model_path
                .as_ref()
                .is_some_and(|p| cli_utils::expand_tilde(p).exists())
    }

    async fn transcribe(&self, audio: Bytes, format: AudioFormat) -> Result<String> {
        let binary = self
            .find_binary()
            .ok_or_else(|| anyhow!("whisper-cli binary not found in PATH"))?;

        let model_path = self.get_model_path()?;

        // whisper-cli needs a file path; it handles non-WAV input via ffmpeg.
        let (_temp_file, audio_path) = cli_utils::write_temp_audio(&audio, format)?;

        let mut cmd = Command::new(&binary);
        cmd.arg("-m").arg(&model_path);
        cmd.arg("-f").arg(&audio_path);
        cmd.arg("-oj"); // Output JSON
        cmd.arg("--no-prints"); // Suppress progress output

        if let Some(ref lang) = self.language {
            cmd.arg("-l").arg(lang);
        }

        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let output = cmd
            .output()
            .await
            .context("failed to execute whisper-cli")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("whisper-cli failed: {}", stderr));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let response: WhisperCliResponse =
            serde_json::from_str(&stdout).context("failed to parse whisper-cli JSON output")?;

        let text = response
            .transcription
            .iter()
            .map(|seg| seg.text.trim())
            .collect::<Vec<_>>()
            .join(" ");

        debug!(
            language = response.result.language.as_deref().unwrap_or("?"),
            text_len = text.len(),
            "transcription complete"
        );

        Ok(text)
    }
}

// ── CLI Output Types ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct WhisperCliResponse {
    #[serde(default)]
    result: WhisperCliResult,
    #[serde(default)]
    transcription: Vec<WhisperCliSegment>,
}

#[derive(Debug, Default, Deserialize)]
struct WhisperCliResult {
    #[serde(default)]
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WhisperCliSegment {
    #[serde(default)]
    text: String,
}
