// Tasklist - a to-do list persisted in a key-value storage slot

pub mod config;
pub mod file_storage;
pub mod sqlite_storage;
pub mod storage;
pub mod store;
pub mod task;
pub mod view;

// Re-export main types for convenience
pub use config::{Backend, Config};
pub use file_storage::FileStorage;
pub use sqlite_storage::SqliteStorage;
pub use storage::{KeyValueStorage, MemoryStorage};
pub use store::{DEFAULT_KEY, TaskStore};
pub use task::{Stats, Task, TaskId, now_ms};
