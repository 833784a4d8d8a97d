use super::entry::StateEntry;
use super::keys::{
    CONVERSATION_LAYER, TEMP_LAYER, USER_LAYER, conversation_key, custom_key, user_key,
};
use super::turn_state::{HISTORY_KEY, TurnState};
use crate::core::history::ConversationHistory;
use crate::core::storage::Storage;
use crate::error::{StateError, TurnError};
use crate::transport::Activity;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Derives the identifier of an application-defined scope from an activity.
pub type ScopeKeyFn = Arc<dyn Fn(&Activity) -> String + Send + Sync>;

#[derive(Clone)]
struct CustomScope {
    name: String,
    key_fn: ScopeKeyFn,
}

/// Storage keys resolved for one activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnKeys {
    pub conversation: String,
    pub user: String,
    pub custom: BTreeMap<String, String>,
}

impl TurnKeys {
    pub fn all(&self) -> Vec<String> {
        let mut keys = vec![self.conversation.clone(), self.user.clone()];
        keys.extend(self.custom.values().cloned());
        keys
    }

    /// Every layer must own a distinct record.
    fn ensure_distinct(&self) -> Result<(), StateError> {
        let mut seen = std::collections::BTreeSet::new();
        for key in self.all() {
            if !seen.insert(key.clone()) {
                return Err(StateError::KeyCollision { key });
            }
        }
        Ok(())
    }
}

/// Builds a fresh [`TurnState`] for each incoming turn.
///
/// Created once at startup and shared; holds no per-turn data itself.
#[derive(Clone)]
pub struct StateLoader {
    storage: Arc<dyn Storage>,
    namespace: Option<String>,
    max_history: usize,
    scopes: Vec<CustomScope>,
}

impl StateLoader {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            namespace: None,
            max_history: 50,
            scopes: Vec::new(),
        }
    }

    /// Extra key segment separating deployments that share a backend.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_history_limit(mut self, max_entries: usize) -> Self {
        self.max_history = max_entries;
        self
    }

    /// Add a persistent layer keyed by `key_fn`.
    pub fn with_scope(
        mut self,
        name: impl Into<String>,
        key_fn: impl Fn(&Activity) -> String + Send + Sync + 'static,
    ) -> Result<Self, StateError> {
        let name = name.into();
        let taken = [CONVERSATION_LAYER, USER_LAYER, TEMP_LAYER].contains(&name.as_str())
            || self.scopes.iter().any(|scope| scope.name == name);
        if name.trim().is_empty() || taken {
            return Err(StateError::InvalidScope(name));
        }
        self.scopes.push(CustomScope {
            name,
            key_fn: Arc::new(key_fn),
        });
        Ok(self)
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn keys_for(&self, activity: &Activity) -> TurnKeys {
        let ns = self.namespace.as_deref();
        TurnKeys {
            conversation: conversation_key(ns, &activity.channel_id, &activity.conversation_id),
            user: user_key(ns, &activity.channel_id, &activity.user_id),
            custom: self
                .scopes
                .iter()
                .map(|scope| {
                    let id = (scope.key_fn)(activity);
                    (
                        scope.name.clone(),
                        custom_key(ns, &activity.channel_id, &scope.name, &id),
                    )
                })
                .collect(),
        }
    }

    /// Read every persistent layer for `activity`; missing records start empty.
    pub async fn load(&self, activity: &Activity) -> Result<TurnState, TurnError> {
        let keys = self.keys_for(activity);
        keys.ensure_distinct()?;
        let mut items = self.storage.read(&keys.all()).await?;

        let mut history = ConversationHistory::new(self.max_history);
        let conversation = match items.remove(&keys.conversation) {
            Some(serde_json::Value::Object(mut map)) => {
                if let Some(stored) = map.remove(HISTORY_KEY) {
                    history = ConversationHistory::from_value(stored, self.max_history)?;
                }
                StateEntry::from_record(&keys.conversation, serde_json::Value::Object(map))?
            }
            Some(_) => {
                return Err(StateError::CorruptRecord {
                    key: keys.conversation,
                }
                .into());
            }
            None => StateEntry::new(&keys.conversation),
        };

        let user = match items.remove(&keys.user) {
            Some(record) => StateEntry::from_record(&keys.user, record)?,
            None => StateEntry::new(&keys.user),
        };

        let mut custom = BTreeMap::new();
        for (name, key) in &keys.custom {
            let entry = match items.remove(key) {
                Some(record) => StateEntry::from_record(key, record)?,
                None => StateEntry::new(key),
            };
            custom.insert(name.clone(), entry);
        }

        tracing::debug!(
            backend = self.storage.name(),
            conversation = %keys.conversation,
            user = %keys.user,
            custom_layers = custom.len(),
            history_len = history.len(),
            "turn state loaded"
        );

        Ok(TurnState::from_parts(
            Arc::clone(&self.storage),
            conversation,
            user,
            custom,
            history,
        ))
    }
}

/// Load the scoped state for one turn.
pub async fn load_scoped_state(
    loader: &StateLoader,
    activity: &Activity,
) -> Result<TurnState, TurnError> {
    loader.load(activity).await
}
