use super::tokenizer::Tokenizer;
use crate::error::StateError;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl MessageRole {
    fn label(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Assistant",
            Self::System => "System",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: MessageRole,
    pub text: String,
}

impl HistoryEntry {
    fn line(&self) -> String {
        format!("{}: {}", self.role.label(), self.text)
    }
}

/// Bounded, append-only transcript of a conversation.
///
/// Once `max_entries` is reached the oldest entry is dropped on append.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationHistory {
    entries: VecDeque<HistoryEntry>,
    max_entries: usize,
    changed: bool,
}

impl ConversationHistory {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries: max_entries.max(1),
            changed: false,
        }
    }

    /// Restore from the persisted form written by [`Self::to_value`].
    pub fn from_value(value: serde_json::Value, max_entries: usize) -> Result<Self, StateError> {
        let stored: Vec<HistoryEntry> =
            serde_json::from_value(value).map_err(|e| StateError::History(e.to_string()))?;
        let mut history = Self::new(max_entries);
        let skip = stored.len().saturating_sub(history.max_entries);
        history.entries.extend(stored.into_iter().skip(skip));
        Ok(history)
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::Value::Array(
            self.entries
                .iter()
                .filter_map(|entry| serde_json::to_value(entry).ok())
                .collect(),
        )
    }

    pub fn append(&mut self, role: MessageRole, text: impl Into<String>) {
        self.entries.push_back(HistoryEntry {
            role,
            text: text.into(),
        });
        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
        self.changed = true;
    }

    /// Render the most recent entries that fit in `max_tokens`.
    ///
    /// Walks backwards from the newest entry and stops at the first one that
    /// would overflow the budget, so the output is always a contiguous,
    /// chronologically ordered suffix of the transcript.
    pub fn render(&self, max_tokens: usize, tokenizer: &dyn Tokenizer, separator: &str) -> String {
        let separator_cost = tokenizer.count(separator);
        let mut used = 0usize;
        let mut kept: Vec<String> = Vec::new();

        for entry in self.entries.iter().rev() {
            let line = entry.line();
            let cost = tokenizer.count(&line) + if kept.is_empty() { 0 } else { separator_cost };
            if used + cost > max_tokens {
                break;
            }
            used += cost;
            kept.push(line);
        }

        kept.reverse();
        kept.join(separator)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.entries.clear();
            self.changed = true;
        }
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub(crate) fn has_changed(&self) -> bool {
        self.changed
    }

    pub(crate) fn mark_saved(&mut self) {
        self.changed = false;
    }
}
