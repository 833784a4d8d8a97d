use super::value::Value;
use crate::error::StateError;
use std::collections::BTreeMap;

/// One storage layer of turn state.
///
/// Tracks whether it changed since load and whether it was logically deleted.
/// A deleted entry reads as empty; the next mutation brings it back.
#[derive(Debug, Clone, PartialEq)]
pub struct StateEntry {
    storage_key: String,
    values: BTreeMap<String, Value>,
    dirty: bool,
    deleted: bool,
}

impl StateEntry {
    /// A fresh, empty entry. Not dirty until written.
    pub fn new(storage_key: impl Into<String>) -> Self {
        Self {
            storage_key: storage_key.into(),
            values: BTreeMap::new(),
            dirty: false,
            deleted: false,
        }
    }

    /// Rebuild an entry from a persisted record.
    pub fn from_record(
        storage_key: impl Into<String>,
        record: serde_json::Value,
    ) -> Result<Self, StateError> {
        let storage_key = storage_key.into();
        let serde_json::Value::Object(map) = record else {
            return Err(StateError::CorruptRecord { key: storage_key });
        };
        Ok(Self {
            values: map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            storage_key,
            dirty: false,
            deleted: false,
        })
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        if self.deleted {
            return None;
        }
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.resurrect();
        self.values.insert(key.into(), value.into());
        self.dirty = true;
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        if self.deleted {
            return None;
        }
        let removed = self.values.remove(key);
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    /// Swap the whole value map in one step.
    pub fn replace(&mut self, values: BTreeMap<String, Value>) {
        self.resurrect();
        self.values = values;
        self.dirty = true;
    }

    /// Logically delete the layer; persisted as a storage delete on save.
    pub fn delete(&mut self) {
        self.values.clear();
        self.deleted = true;
        self.dirty = true;
    }

    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Serialized form written to storage.
    pub fn to_record(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::from(v.clone())))
                .collect(),
        )
    }

    fn resurrect(&mut self) {
        if self.deleted {
            self.deleted = false;
            self.values.clear();
        }
    }
}
