//! Claude Code CLI backend implementation.
//!
//! Runs the `claude` binary in non-interactive mode (`-p`) with JSON output
//! and resumes prior conversations via `--resume <session-id>`. The session
//! id in the result envelope becomes the opaque handle courier persists.

use std::{path::PathBuf, process::Stdio};

use {
    anyhow::{Context, Result, anyhow},
    async_trait::async_trait,
    serde::Deserialize,
    tokio::process::Command,
    tracing::debug,
};

use crate::{BackendClient, BackendRequest, BackendTurn};

/// Binary name for the Claude Code CLI.
const BINARY_NAME: &str = "claude";

/// Claude Code CLI backend.
#[derive(Clone, Debug, Default)]
pub struct ClaudeCliBackend {
    binary_path: Option<String>,
    working_dir: Option<PathBuf>,
    /// Auto-approve tool use (`--permission-mode bypassPermissions`).
    bypass_permissions: bool,
    max_turns: Option<u32>,
}

impl ClaudeCliBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_options(
        binary_path: Option<String>,
        working_dir: Option<PathBuf>,
        bypass_permissions: bool,
        max_turns: Option<u32>,
    ) -> Self {
        Self {
            binary_path,
            working_dir,
            bypass_permissions,
            max_turns,
        }
    }

    fn find_binary(&self) -> Option<PathBuf> {
        if let Some(ref path) = self.binary_path {
            let p = PathBuf::from(path);
            if p.exists() && p.is_file() {
                return Some(p);
            }
        }
        which::which(BINARY_NAME).ok()
    }
}

#[async_trait]
impl BackendClient for ClaudeCliBackend {
    fn id(&self) -> &'static str {
        "claude-cli"
    }

    fn is_configured(&self) -> bool {
        self.find_binary().is_some()
    }

    async fn invoke(&self, request: BackendRequest) -> Result<BackendTurn> {
        let binary = self
            .find_binary()
            .ok_or_else(|| anyhow!("claude binary not found in PATH"))?;

        let mut cmd = Command::new(&binary);
        cmd.arg("-p").arg(&request.prompt);
        cmd.arg("--output-format").arg("json");

        if let Some(ref handle) = request.resume_handle {
            cmd.arg("--resume").arg(handle);
        }
        if let Some(ref system_prompt) = request.system_prompt {
            cmd.arg("--append-system-prompt").arg(system_prompt);
        }
        if let Some(max_turns) = self.max_turns {
            cmd.arg("--max-turns").arg(max_turns.to_string());
        }
        if self.bypass_permissions {
            cmd.arg("--permission-mode").arg("bypassPermissions");
        }
        if let Some(ref dir) = self.working_dir {
            cmd.current_dir(dir);
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        debug!(
            resume = request.resume_handle.as_deref().unwrap_or("<fresh>"),
            prompt_len = request.prompt.len(),
            "invoking claude CLI"
        );

        let output = cmd.output().await.context("failed to execute claude")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("claude exited with {}: {}", output.status, stderr.trim()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let envelope: ResultEnvelope =
            serde_json::from_str(&stdout).context("failed to parse claude JSON output")?;

        if envelope.is_error {
            return Err(anyhow!(
                "claude reported an error: {}",
                envelope.result.as_deref().unwrap_or("<no detail>")
            ));
        }

        Ok(BackendTurn {
            text: envelope.result.unwrap_or_default(),
            handle: envelope.session_id,
        })
    }
}

// ── CLI Output Types ──────────────────────────────────────────────────────

/// Final result envelope emitted by `claude -p --output-format json`.
#[derive(Debug, Deserialize)]
struct ResultEnvelope {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    is_error: bool,
}
