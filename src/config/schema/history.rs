use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Entries kept per conversation; older ones are dropped on append.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Budget passed to the planner prompt, counted by `tokenizer`.
    #[serde(default = "default_render_max_chars")]
    pub render_max_chars: usize,
    #[serde(default = "default_separator")]
    pub separator: String,
    /// "chars" | "words"
    #[serde(default = "default_tokenizer")]
    pub tokenizer: String,
    /// Record inbound user text as a history entry.
    #[serde(default = "default_true")]
    pub record_input: bool,
}

fn default_max_entries() -> usize {
    50
}

fn default_render_max_chars() -> usize {
    2000
}

fn default_separator() -> String {
    "\n\n".into()
}

fn default_tokenizer() -> String {
    "chars".into()
}

fn default_true() -> bool {
    true
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            render_max_chars: default_render_max_chars(),
            separator: default_separator(),
            tokenizer: default_tokenizer(),
            record_input: true,
        }
    }
}
