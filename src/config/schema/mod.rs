mod core;
mod execution;
mod history;
mod observability;
mod storage;

pub use self::core::Config;
pub use execution::ExecutionConfig;
pub use history::HistoryConfig;
pub use observability::ObservabilityConfig;
pub use storage::StorageConfig;
