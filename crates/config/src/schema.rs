//! Config schema types.

use std::path::PathBuf;

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CourierConfig {
    pub telegram: TelegramConfig,
    pub backend: BackendConfig,
    pub voice: VoiceConfig,
    pub storage: StorageConfig,
    pub dispatch: DispatchConfig,
}

/// Telegram bot account configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Chat ID allowlist. Empty means the bot serves any chat it is in.
    pub allowed_chats: Vec<i64>,
}

impl TelegramConfig {
    /// True once a token has been provided.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.token.expose_secret().is_empty()
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("allowed_chats", &self.allowed_chats)
            .finish()
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            allowed_chats: Vec::new(),
        }
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

/// Assistant-backend (CLI subprocess) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Path to the backend binary. `None` means resolve from `$PATH`.
    pub binary: Option<String>,

    /// Working directory for backend invocations.
    pub working_dir: Option<PathBuf>,

    /// Skip the backend's interactive permission prompts. Only enable for
    /// a bot that already gates access upstream.
    pub bypass_permissions: bool,

    /// Cap on agentic turns per invocation. `None` leaves the backend's
    /// own default in place.
    pub max_turns: Option<u32>,

    /// Upper bound on one invocation, in seconds.
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            binary: None,
            working_dir: None,
            bypass_permissions: false,
            max_turns: None,
            timeout_secs: 300,
        }
    }
}

/// Voice transcription configuration. Transcription stays disabled until a
/// model path is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Path to the transcriber binary. `None` means resolve from `$PATH`.
    pub binary: Option<String>,

    /// Path to the speech model file.
    pub model: Option<PathBuf>,

    /// Spoken language hint ("auto" detects).
    pub language: Option<String>,
}

/// On-disk state location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for chat session records. `None` means the platform data
    /// dir (`~/.local/share/courier/` on Linux).
    pub data_dir: Option<PathBuf>,
}

/// Dispatcher tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// How long a message waits for its chat's pipeline slot before getting
    /// a "busy" reply, in seconds.
    pub lock_timeout_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            lock_timeout_secs: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = CourierConfig::default();
        assert!(!cfg.telegram.is_configured());
        assert!(cfg.telegram.allowed_chats.is_empty());
        assert_eq!(cfg.backend.timeout_secs, 300);
        assert!(!cfg.backend.bypass_permissions);
        assert_eq!(cfg.dispatch.lock_timeout_secs, 30);
        assert!(cfg.voice.model.is_none());
    }

    #[test]
    fn deserialize_partial_toml() {
        let cfg: CourierConfig = toml::from_str(
            r#"
            [telegram]
            token         = "123:ABC"
            allowed_chats = [-100200300]

            [backend]
            timeout_secs = 60
            "#,
        )
        .unwrap();
        assert_eq!(cfg.telegram.token.expose_secret(), "123:ABC");
        assert_eq!(cfg.telegram.allowed_chats, vec![-100_200_300]);
        assert_eq!(cfg.backend.timeout_secs, 60);
        // Unspecified sections keep their defaults.
        assert_eq!(cfg.dispatch.lock_timeout_secs, 30);
    }

    #[test]
    fn debug_never_prints_the_token() {
        let cfg: CourierConfig = toml::from_str("[telegram]\ntoken = \"supersecret\"").unwrap();
        let debug = format!("{cfg:?}");
        assert!(!debug.contains("supersecret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn serialize_roundtrip_preserves_token() {
        let cfg = CourierConfig {
            telegram: TelegramConfig {
                token: Secret::new("tok".into()),
                allowed_chats: vec![1, 2],
            },
            ..Default::default()
        };
        let toml_str = toml::to_string(&cfg).unwrap();
        let cfg2: CourierConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(cfg2.telegram.token.expose_secret(), "tok");
        assert_eq!(cfg2.telegram.allowed_chats, vec![1, 2]);
    }
}
