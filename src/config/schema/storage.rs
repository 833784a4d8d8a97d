use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// "memory" | "sqlite"
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Sqlite file; relative paths resolve against the data directory.
    #[serde(default = "default_path")]
    pub path: PathBuf,
}

fn default_backend() -> String {
    "sqlite".into()
}

fn default_path() -> PathBuf {
    PathBuf::from("state.db")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_path(),
        }
    }
}
