//! Shared helpers for CLI-based transcription engines.

use {
    anyhow::{Context, Result},
    std::path::PathBuf,
    tempfile::NamedTempFile,
};

use courier_common::types::AudioFormat;

/// Find a binary in PATH or at a specific path.
///
/// If `config_path` is Some, it's checked first. If None or not found,
/// searches the system PATH.
pub fn find_binary(name: &str, config_path: Option<&str>) -> Option<PathBuf> {
    if let Some(path_str) = config_path {
        let path = expand_tilde(path_str);
        if path.exists() && path.is_file() {
            return Some(path);
        }
    }

    which::which(name).ok()
}

/// Expand `~` to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(stripped);
    }
    PathBuf::from(path)
}

/// Write audio data to a temporary file for CLI processing.
///
/// Returns the temp file handle (keeps file alive) and its path.
pub fn write_temp_audio(audio: &[u8], format: AudioFormat) -> Result<(NamedTempFile, PathBuf)> {
    let temp_file = NamedTempFile::with_suffix(format!(".{}", format.extension()))
        .context("failed to create temp audio file")?;

    std::fs::write(temp_file.path(), audio).context("failed to write audio to temp file")?;

    let path = temp_file.path().to_path_buf();
    Ok((temp_file, path))
}
