use super::traits::{Storage, StorageBatch, StoreItems};
use crate::error::StorageError;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use tokio::sync::RwLock;

/// Process-local storage. Records are cloned in and out so callers never
/// share mutable state with the store.
#[derive(Default)]
pub struct MemoryStorage {
    records: RwLock<HashMap<String, serde_json::Value>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.records.read().await.keys().cloned().collect();
        keys.sort_unstable();
        keys
    }
}

impl Storage for MemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }

    fn read<'a>(
        &'a self,
        keys: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<StoreItems, StorageError>> + Send + 'a>> {
        Box::pin(async move {
            let records = self.records.read().await;
            Ok(keys
                .iter()
                .filter_map(|key| records.get(key).map(|value| (key.clone(), value.clone())))
                .collect())
        })
    }

    fn write<'a>(
        &'a self,
        items: StoreItems,
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + 'a>> {
        Box::pin(async move {
            self.records.write().await.extend(items);
            Ok(())
        })
    }

    fn delete<'a>(
        &'a self,
        keys: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + 'a>> {
        Box::pin(async move {
            let mut records = self.records.write().await;
            for key in keys {
                records.remove(key);
            }
            Ok(())
        })
    }

    fn apply<'a>(
        &'a self,
        batch: StorageBatch,
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + 'a>> {
        Box::pin(async move {
            let mut records = self.records.write().await;
            for key in &batch.deletes {
                records.remove(key);
            }
            records.extend(batch.upserts);
            Ok(())
        })
    }
}
