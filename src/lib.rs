//! Prioritized task list: an ordered in-memory list that is re-sorted on change and
//! persisted as a single JSON snapshot in a flat key-value store.
pub mod commands;
pub mod events;
pub mod models;
pub mod ordering;
pub mod persist;
pub mod state;
pub mod storage;

#[cfg(feature = "cli")]
pub mod cli;
#[cfg(feature = "cli")]
pub mod config;
#[cfg(feature = "cli")]
pub mod logging;
#[cfg(feature = "cli")]
pub mod render;

pub use models::{PriorityLevel, Settings, Task, Theme};
pub use persist::{BackgroundPersister, InlinePersister, Persist};
pub use state::{TaskError, TaskList};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError, TaskStore};

#[cfg(feature = "cli")]
pub fn run() -> i32 {
    cli::run()
}
