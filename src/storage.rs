use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::events::{report_failure, FailureHook, StoreFailure};
use crate::models::{Settings, Task};

pub const TASKS_KEY: &str = "tasks_v1";
pub const SETTINGS_KEY: &str = "settings_v1";
const VALUE_EXTENSION: &str = "json";

#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    Json(serde_json::Error),
    InvalidKey(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(err) => write!(f, "io error: {err}"),
            StorageError::Json(err) => write!(f, "json error: {err}"),
            StorageError::InvalidKey(key) => write!(f, "invalid storage key: {key:?}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(value: std::io::Error) -> Self {
        StorageError::Io(value)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(value: serde_json::Error) -> Self {
        StorageError::Json(value)
    }
}

/// Flat string-keyed storage backend.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Stores each key as `<root>/<key>.json`.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn ensure_dirs(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        if !is_valid_key(key) {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.{VALUE_EXTENSION}")))
    }

    fn write_atomic(&self, path: PathBuf, bytes: &[u8]) -> Result<(), StorageError> {
        let temp_path = path.with_extension("tmp");
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(bytes)?;
            file.sync_all()?;
        }
        fs::rename(temp_path, path)?;
        Ok(())
    }
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(path) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        self.ensure_dirs()?;
        self.write_atomic(path, value.as_bytes())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self.values.lock().expect("store poisoned");
        Ok(guard.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self.values.lock().expect("store poisoned");
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

fn load_json<T: DeserializeOwned>(
    backend: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match backend.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

fn save_json<T: Serialize + ?Sized>(
    backend: &dyn KeyValueStore,
    key: &str,
    data: &T,
) -> Result<(), StorageError> {
    let json = serde_json::to_string(data)?;
    backend.set(key, &json)
}

/// The task list blob under [`TASKS_KEY`].
#[derive(Clone)]
pub struct TaskStore {
    backend: Arc<dyn KeyValueStore>,
    on_failure: Option<FailureHook>,
}

impl TaskStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            on_failure: None,
        }
    }

    pub fn with_failure_hook(mut self, hook: FailureHook) -> Self {
        self.on_failure = Some(hook);
        self
    }

    /// Loads the stored list. Absent or undecodable blobs yield an empty list.
    pub fn load(&self) -> Vec<Task> {
        match self.try_load() {
            Ok(tasks) => {
                log::info!("tasks loaded key={TASKS_KEY} count={}", tasks.len());
                tasks
            }
            Err(error) => {
                report_failure(self.on_failure.as_ref(), StoreFailure::Decode(error));
                Vec::new()
            }
        }
    }

    pub fn try_load(&self) -> Result<Vec<Task>, StorageError> {
        Ok(load_json(self.backend.as_ref(), TASKS_KEY)?.unwrap_or_default())
    }

    /// Overwrites the stored list with `tasks`.
    pub fn save(&self, tasks: &[Task]) -> Result<(), StorageError> {
        save_json(self.backend.as_ref(), TASKS_KEY, tasks)
    }

    /// Saves and reports a failure instead of returning it.
    pub(crate) fn save_reporting(&self, tasks: &[Task]) {
        match self.save(tasks) {
            Ok(()) => log::debug!("tasks persisted key={TASKS_KEY} count={}", tasks.len()),
            Err(error) => {
                report_failure(self.on_failure.as_ref(), StoreFailure::Persist(error))
            }
        }
    }
}

/// Presentation settings under [`SETTINGS_KEY`].
#[derive(Clone)]
pub struct SettingsStore {
    backend: Arc<dyn KeyValueStore>,
}

impl SettingsStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub fn load(&self) -> Settings {
        match load_json(self.backend.as_ref(), SETTINGS_KEY) {
            Ok(settings) => settings.unwrap_or_default(),
            Err(error) => {
                log::warn!("settings unreadable, using defaults: {error}");
                Settings::default()
            }
        }
    }

    pub fn save(&self, settings: &Settings) -> Result<(), StorageError> {
        save_json(self.backend.as_ref(), SETTINGS_KEY, settings)
    }
}
