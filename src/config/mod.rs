pub mod schema;

pub use schema::{Config, ExecutionConfig, HistoryConfig, ObservabilityConfig, StorageConfig};
