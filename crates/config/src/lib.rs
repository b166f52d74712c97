//! Configuration loading and env substitution.
//!
//! Config files: `courier.toml` or `courier.json`, searched in `./` then
//! `~/.config/courier/`. Supports `${ENV_VAR}` substitution in all string
//! values.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{config_dir, data_dir, discover_and_load, load_config},
    schema::{BackendConfig, CourierConfig, DispatchConfig, StorageConfig, TelegramConfig, VoiceConfig},
};
