use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Persist what earlier commands did when a later one fails.
    #[serde(default = "default_true")]
    pub save_on_error: bool,
    /// Persist a turn cut off by the deadline.
    #[serde(default)]
    pub save_on_cancel: bool,
    /// Turn deadline in seconds; 0 disables it.
    #[serde(default = "default_turn_timeout_secs")]
    pub turn_timeout_secs: u64,
    /// Sent outward when a turn fails.
    #[serde(default = "default_apology_message")]
    pub apology_message: String,
}

fn default_true() -> bool {
    true
}

fn default_turn_timeout_secs() -> u64 {
    30
}

fn default_apology_message() -> String {
    "The bot encountered an error or bug.".into()
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            save_on_error: true,
            save_on_cancel: false,
            turn_timeout_secs: default_turn_timeout_secs(),
            apology_message: default_apology_message(),
        }
    }
}
