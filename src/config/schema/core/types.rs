use super::super::{ExecutionConfig, HistoryConfig, ObservabilityConfig, StorageConfig};
use crate::core::history::tokenizer_for;
use crate::error::ConfigError;
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory - computed from home, not serialized
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Extra storage-key segment for deployments sharing one backend.
    #[serde(default)]
    pub bot_id: Option<String>,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Default for Config {
    fn default() -> Self {
        let home =
            UserDirs::new().map_or_else(|| PathBuf::from("."), |u| u.home_dir().to_path_buf());
        let turnwise_dir = home.join(".turnwise");

        Self {
            config_path: turnwise_dir.join("config.toml"),
            data_dir: turnwise_dir,
            bot_id: None,
            storage: StorageConfig::default(),
            history: HistoryConfig::default(),
            execution: ExecutionConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.storage.backend.as_str() {
            "memory" => {}
            "sqlite" => {
                if self.storage.path.as_os_str().is_empty() {
                    return Err(ConfigError::Validation(
                        "storage.path must be set for the sqlite backend".into(),
                    ));
                }
            }
            other => {
                return Err(ConfigError::Validation(format!(
                    "storage.backend must be \"memory\" or \"sqlite\", got \"{other}\""
                )));
            }
        }

        if self.history.max_entries == 0 {
            return Err(ConfigError::Validation(
                "history.max_entries must be at least 1".into(),
            ));
        }
        if self.history.render_max_chars == 0 {
            return Err(ConfigError::Validation(
                "history.render_max_chars must be at least 1".into(),
            ));
        }
        if tokenizer_for(&self.history.tokenizer).is_none() {
            return Err(ConfigError::Validation(format!(
                "history.tokenizer must be \"chars\" or \"words\", got \"{}\"",
                self.history.tokenizer
            )));
        }

        if self
            .observability
            .log_level
            .parse::<tracing::Level>()
            .is_err()
        {
            return Err(ConfigError::Validation(format!(
                "observability.log_level is not a tracing level: \"{}\"",
                self.observability.log_level
            )));
        }

        if let Some(bot_id) = &self.bot_id
            && bot_id.trim().is_empty()
        {
            return Err(ConfigError::Validation("bot_id cannot be blank".into()));
        }

        Ok(())
    }
}
