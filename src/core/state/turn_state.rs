use super::entry::StateEntry;
use super::keys::{CONVERSATION_LAYER, TEMP_LAYER, USER_LAYER};
use super::value::Value;
use crate::core::history::ConversationHistory;
use crate::core::storage::{Storage, StorageBatch};
use crate::error::{StateError, StorageError};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Reserved conversation-layer key holding the serialized history.
pub const HISTORY_KEY: &str = "__history__";

/// What a successful [`TurnState::save`] flushed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub written: Vec<String>,
    pub deleted: Vec<String>,
}

impl SaveReport {
    pub fn is_empty(&self) -> bool {
        self.written.is_empty() && self.deleted.is_empty()
    }
}

/// Layered working state for one turn of one conversation.
///
/// Reads and writes stay in memory until [`TurnState::save`] succeeds. The
/// temp layer starts empty every turn and is never written to storage.
pub struct TurnState {
    storage: Arc<dyn Storage>,
    conversation: StateEntry,
    user: StateEntry,
    temp: StateEntry,
    custom: BTreeMap<String, StateEntry>,
    history: ConversationHistory,
}

impl TurnState {
    pub(crate) fn from_parts(
        storage: Arc<dyn Storage>,
        conversation: StateEntry,
        user: StateEntry,
        custom: BTreeMap<String, StateEntry>,
        history: ConversationHistory,
    ) -> Self {
        Self {
            storage,
            conversation,
            user,
            temp: StateEntry::new(TEMP_LAYER),
            custom,
            history,
        }
    }

    pub fn conversation(&self) -> &StateEntry {
        &self.conversation
    }

    pub fn conversation_mut(&mut self) -> &mut StateEntry {
        &mut self.conversation
    }

    pub fn user(&self) -> &StateEntry {
        &self.user
    }

    pub fn user_mut(&mut self) -> &mut StateEntry {
        &mut self.user
    }

    pub fn temp(&self) -> &StateEntry {
        &self.temp
    }

    pub fn temp_mut(&mut self) -> &mut StateEntry {
        &mut self.temp
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut ConversationHistory {
        &mut self.history
    }

    /// Names of every layer, built-ins first.
    pub fn layer_names(&self) -> Vec<&str> {
        let mut names = vec![CONVERSATION_LAYER, USER_LAYER, TEMP_LAYER];
        names.extend(self.custom.keys().map(String::as_str));
        names
    }

    pub fn layer(&self, name: &str) -> Result<&StateEntry, StateError> {
        match name {
            CONVERSATION_LAYER => Ok(&self.conversation),
            USER_LAYER => Ok(&self.user),
            TEMP_LAYER => Ok(&self.temp),
            other => self
                .custom
                .get(other)
                .ok_or_else(|| StateError::UnknownLayer(other.to_string())),
        }
    }

    pub fn layer_mut(&mut self, name: &str) -> Result<&mut StateEntry, StateError> {
        match name {
            CONVERSATION_LAYER => Ok(&mut self.conversation),
            USER_LAYER => Ok(&mut self.user),
            TEMP_LAYER => Ok(&mut self.temp),
            other => self
                .custom
                .get_mut(other)
                .ok_or_else(|| StateError::UnknownLayer(other.to_string())),
        }
    }

    pub fn get_value(&self, layer: &str, key: &str) -> Result<Option<&Value>, StateError> {
        Ok(self.layer(layer)?.get(key))
    }

    pub fn set_value(
        &mut self,
        layer: &str,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<(), StateError> {
        if layer == CONVERSATION_LAYER && key == HISTORY_KEY {
            return Err(StateError::ReservedKey(HISTORY_KEY.to_string()));
        }
        self.layer_mut(layer)?.set(key, value);
        Ok(())
    }

    pub fn delete_value(&mut self, layer: &str, key: &str) -> Result<Option<Value>, StateError> {
        Ok(self.layer_mut(layer)?.remove(key))
    }

    /// Logically delete a persistent layer. Deleting the conversation layer
    /// also drops its history.
    pub fn delete_layer(&mut self, layer: &str) -> Result<(), StateError> {
        if layer == TEMP_LAYER {
            return Err(StateError::NotPersistent {
                layer: TEMP_LAYER.to_string(),
            });
        }
        self.layer_mut(layer)?.delete();
        if layer == CONVERSATION_LAYER {
            self.history.clear();
        }
        Ok(())
    }

    /// True when `save` would write or delete anything.
    pub fn has_pending_changes(&self) -> bool {
        self.conversation.is_dirty()
            || self.history.has_changed()
            || self.user.is_dirty()
            || self.custom.values().any(StateEntry::is_dirty)
    }

    /// Changes `save` would flush, without clearing any dirty flags.
    pub fn pending_batch(&self) -> StorageBatch {
        let mut batch = StorageBatch::default();

        if self.conversation.is_dirty() || self.history.has_changed() {
            let key = self.conversation.storage_key().to_string();
            if self.conversation.is_deleted() && self.history.is_empty() {
                batch.deletes.push(key);
            } else {
                let mut record = self.conversation.to_record();
                if !self.history.is_empty()
                    && let serde_json::Value::Object(map) = &mut record
                {
                    map.insert(HISTORY_KEY.to_string(), self.history.to_value());
                }
                batch.upserts.insert(key, record);
            }
        }

        for entry in std::iter::once(&self.user).chain(self.custom.values()) {
            if !entry.is_dirty() {
                continue;
            }
            if entry.is_deleted() {
                batch.deletes.push(entry.storage_key().to_string());
            } else {
                batch
                    .upserts
                    .insert(entry.storage_key().to_string(), entry.to_record());
            }
        }

        batch
    }

    /// Flush dirty persistent layers in one batch.
    ///
    /// Dirty flags are cleared only after the backend accepted the batch, so a
    /// failed save can be retried as-is.
    pub async fn save(&mut self) -> Result<SaveReport, StorageError> {
        let batch = self.pending_batch();
        if batch.is_empty() {
            return Ok(SaveReport::default());
        }

        let mut report = SaveReport {
            written: batch.upserts.keys().cloned().collect(),
            deleted: batch.deletes.clone(),
        };
        report.written.sort_unstable();

        self.storage.apply(batch).await?;

        self.conversation.mark_clean();
        self.user.mark_clean();
        for entry in self.custom.values_mut() {
            entry.mark_clean();
        }
        self.history.mark_saved();

        tracing::debug!(
            backend = self.storage.name(),
            written = report.written.len(),
            deleted = report.deleted.len(),
            "turn state saved"
        );
        Ok(report)
    }
}

impl std::fmt::Debug for TurnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnState")
            .field("storage", &self.storage.name())
            .field("conversation", &self.conversation)
            .field("user", &self.user)
            .field("temp", &self.temp)
            .field("custom", &self.custom)
            .field("history_len", &self.history.len())
            .finish()
    }
}
