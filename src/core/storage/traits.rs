use crate::error::StorageError;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

/// Serialized records keyed by storage key.
pub type StoreItems = HashMap<String, serde_json::Value>;

/// A set of changes applied together at the end of a turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StorageBatch {
    pub upserts: StoreItems,
    pub deletes: Vec<String>,
}

impl StorageBatch {
    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.deletes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.upserts.len() + self.deletes.len()
    }
}

/// Key/value persistence for state layers. Last write wins.
pub trait Storage: Send + Sync {
    /// Backend name, used in logs and errors
    fn name(&self) -> &str;

    /// Fetch the records that exist among `keys`; missing keys are omitted.
    fn read<'a>(
        &'a self,
        keys: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<StoreItems, StorageError>> + Send + 'a>>;

    /// Insert or overwrite every item.
    fn write<'a>(
        &'a self,
        items: StoreItems,
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + 'a>>;

    /// Remove records; unknown keys are ignored.
    fn delete<'a>(
        &'a self,
        keys: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + 'a>>;

    /// Apply deletes and upserts as one logical write.
    ///
    /// Backends with transactions should override this so a failure leaves
    /// nothing half-applied.
    fn apply<'a>(
        &'a self,
        batch: StorageBatch,
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + 'a>> {
        Box::pin(async move {
            if !batch.deletes.is_empty() {
                self.delete(&batch.deletes).await?;
            }
            if !batch.upserts.is_empty() {
                self.write(batch.upserts).await?;
            }
            Ok(())
        })
    }
}
