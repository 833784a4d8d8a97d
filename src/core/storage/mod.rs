mod memory;
mod sqlite;
mod traits;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageBatch, StoreItems};

use crate::config::StorageConfig;
use crate::error::StorageError;
use std::path::Path;
use std::sync::Arc;

/// Build the storage backend named in config.
///
/// Relative sqlite paths resolve against `data_dir`.
pub async fn create_storage(
    config: &StorageConfig,
    data_dir: &Path,
) -> Result<Arc<dyn Storage>, StorageError> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryStorage::new())),
        "sqlite" => {
            let path = if config.path.is_absolute() {
                config.path.clone()
            } else {
                data_dir.join(&config.path)
            };
            tracing::info!(path = %path.display(), "opening sqlite state storage");
            Ok(Arc::new(SqliteStorage::open(&path).await?))
        }
        other => Err(StorageError::backend(other, "unknown storage backend")),
    }
}
