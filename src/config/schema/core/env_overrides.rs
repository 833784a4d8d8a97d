use super::Config;
use std::path::PathBuf;

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Ok(backend) = std::env::var("TURNWISE_STORAGE_BACKEND")
            && !backend.is_empty()
        {
            self.storage.backend = backend;
        }

        if let Ok(path) = std::env::var("TURNWISE_STORAGE_PATH")
            && !path.is_empty()
        {
            self.storage.path = PathBuf::from(path);
        }

        if let Ok(raw) = std::env::var("TURNWISE_HISTORY_MAX_ENTRIES")
            && let Ok(max_entries) = raw.parse::<usize>()
            && max_entries > 0
        {
            self.history.max_entries = max_entries;
        }

        if let Ok(raw) = std::env::var("TURNWISE_TURN_TIMEOUT_SECS")
            && let Ok(secs) = raw.parse::<u64>()
        {
            self.execution.turn_timeout_secs = secs;
        }

        if let Ok(level) = std::env::var("TURNWISE_LOG_LEVEL")
            && !level.is_empty()
        {
            self.observability.log_level = level;
        }
    }
}
