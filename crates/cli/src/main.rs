//! courier — Telegram relay for a local AI coding assistant.

use std::{path::PathBuf, sync::Arc, time::Duration};

use {
    clap::Parser,
    tracing::{info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    courier_backend::{BackendClient, ClaudeCliBackend},
    courier_dispatch::{AccessPolicy, Dispatcher, DispatcherConfig},
    courier_sessions::{ChatStore, SessionRegistry},
    courier_voice::{Transcriber, WhisperCliTranscriber},
};

#[derive(Parser)]
#[command(name = "courier", about = "Courier — Telegram relay for a local AI coding assistant")]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false)]
    json_logs: bool,

    /// Path to a config file (overrides the standard search locations).
    #[arg(long, env = "COURIER_CONFIG")]
    config: Option<PathBuf>,

    /// Custom data directory (overrides the config value).
    #[arg(long, env = "COURIER_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "courier starting");

    let mut config = match &cli.config {
        Some(path) => courier_config::load_config(path)?,
        None => courier_config::discover_and_load(),
    };
    if let Some(dir) = &cli.data_dir {
        config.storage.data_dir = Some(dir.clone());
    }

    if !config.telegram.is_configured() {
        anyhow::bail!(
            "no telegram bot token configured; set [telegram] token in courier.toml \
             (use ${{TELEGRAM_BOT_TOKEN}} to read it from the environment)"
        );
    }

    let data_dir = courier_config::data_dir(&config);
    info!(data_dir = %data_dir.display(), "using data directory");
    let registry = Arc::new(SessionRegistry::new(ChatStore::new(data_dir)));

    let backend = ClaudeCliBackend::with_options(
        config.backend.binary.clone(),
        config.backend.working_dir.clone(),
        config.backend.bypass_permissions,
        config.backend.max_turns,
    );
    if !backend.is_configured() {
        warn!("claude binary not found in PATH; prompts will fail until it is installed");
    }
    let backend: Arc<dyn BackendClient> = Arc::new(backend);

    let transcriber: Option<Arc<dyn Transcriber>> = match &config.voice.model {
        Some(model) => {
            let engine = WhisperCliTranscriber::with_options(
                config.voice.binary.clone(),
                Some(model.display().to_string()),
                config.voice.language.clone(),
            );
            if engine.is_configured() {
                info!(engine = engine.id(), "voice transcription enabled");
                Some(Arc::new(engine))
            } else {
                warn!("voice model configured but whisper-cli or the model file is missing");
                None
            }
        },
        None => None,
    };

    let (bot, bot_username) = courier_telegram::connect(&config.telegram).await?;

    let dispatcher = Arc::new(Dispatcher::new(
        registry,
        backend,
        transcriber,
        DispatcherConfig {
            policy: AccessPolicy {
                allowed_chats: config.telegram.allowed_chats.clone(),
                bot_username,
            },
            backend_timeout: Duration::from_secs(config.backend.timeout_secs),
            lock_timeout: Duration::from_secs(config.dispatch.lock_timeout_secs),
        },
    ));

    let cancel = courier_telegram::start_polling(bot, dispatcher);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
            cancel.cancel();
        },
        () = cancel.cancelled() => {
            // Polling stopped on its own (e.g. token conflict).
        },
    }

    info!("courier stopped");
    Ok(())
}
