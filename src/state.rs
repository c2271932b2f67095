use std::fmt;
use std::sync::{Arc, Mutex};

use crate::models::{PriorityLevel, Task};
use crate::ordering::sort_tasks;
use crate::persist::Persist;
use crate::storage::TaskStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    IndexOutOfRange { index: usize, len: usize },
    NotLoaded,
    AlreadyLoaded,
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskError::IndexOutOfRange { index, len } => {
                write!(f, "index out of range: {index} (len {len})")
            }
            TaskError::NotLoaded => write!(f, "task list not loaded yet"),
            TaskError::AlreadyLoaded => write!(f, "task list already loaded"),
        }
    }
}

impl std::error::Error for TaskError {}

/// Shared handle to the ordered in-memory task list.
///
/// Indices passed to the mutating operations refer to the most recent snapshot and are
/// invalidated by any mutation. Every mutation dispatches the resulting snapshot to the
/// [`Persist`] sink without waiting for the write.
#[derive(Clone)]
pub struct TaskList {
    inner: Arc<Mutex<TaskListData>>,
    persister: Arc<dyn Persist>,
}

impl TaskList {
    /// Creates an unloaded list. Mutations are rejected until [`TaskList::load`] runs.
    pub fn new(persister: Arc<dyn Persist>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(TaskListData {
                tasks: Vec::new(),
                loaded: false,
            })),
            persister,
        }
    }

    /// Creates a list that is already loaded with `tasks`.
    pub fn with_tasks(tasks: Vec<Task>, persister: Arc<dyn Persist>) -> Self {
        let mut tasks = tasks;
        sort_tasks(&mut tasks);
        Self {
            inner: Arc::new(Mutex::new(TaskListData {
                tasks,
                loaded: true,
            })),
            persister,
        }
    }

    pub fn load(&self, store: &TaskStore) -> Result<Vec<Task>, TaskError> {
        let mut guard = self.inner.lock().expect("state poisoned");
        if guard.loaded {
            return Err(TaskError::AlreadyLoaded);
        }
        let mut tasks = store.load();
        sort_tasks(&mut tasks);
        guard.tasks = tasks;
        guard.loaded = true;
        Ok(guard.tasks.clone())
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.lock().expect("state poisoned").loaded
    }

    pub fn tasks(&self) -> Vec<Task> {
        let guard = self.inner.lock().expect("state poisoned");
        guard.tasks.clone()
    }

    /// Adds a task unless `name` is blank after trimming, in which case nothing changes.
    pub fn add_task(&self, name: &str, priority: PriorityLevel) -> Result<Vec<Task>, TaskError> {
        let mut guard = self.lock_loaded()?;
        let name = name.trim();
        if name.is_empty() {
            log::debug!("add_task ignored: blank name");
            return Ok(guard.tasks.clone());
        }
        guard.tasks.push(Task::new(name, priority));
        sort_tasks(&mut guard.tasks);
        log::debug!("task added priority={} count={}", priority.as_str(), guard.tasks.len());
        Ok(self.dispatch(&guard))
    }

    /// Sets the completion flag. `None` means unchecked. The list is not re-sorted, so
    /// the task keeps its position until the next add, priority change or load.
    pub fn toggle_completed(
        &self,
        index: usize,
        completed: Option<bool>,
    ) -> Result<Vec<Task>, TaskError> {
        let mut guard = self.lock_loaded()?;
        let task = guard.task_mut(index)?;
        task.completed = completed.unwrap_or(false);
        log::debug!("task toggled index={index} completed={}", task.completed);
        Ok(self.dispatch(&guard))
    }

    pub fn delete_task(&self, index: usize) -> Result<Vec<Task>, TaskError> {
        let mut guard = self.lock_loaded()?;
        guard.check_index(index)?;
        guard.tasks.remove(index);
        log::debug!("task deleted index={index} count={}", guard.tasks.len());
        Ok(self.dispatch(&guard))
    }

    pub fn change_priority(
        &self,
        index: usize,
        priority: PriorityLevel,
    ) -> Result<Vec<Task>, TaskError> {
        let mut guard = self.lock_loaded()?;
        guard.task_mut(index)?.priority = priority;
        sort_tasks(&mut guard.tasks);
        log::debug!("task reprioritized index={index} priority={}", priority.as_str());
        Ok(self.dispatch(&guard))
    }

    /// Removes every completed task, keeping the remaining order.
    pub fn clear_completed(&self) -> Result<Vec<Task>, TaskError> {
        let mut guard = self.lock_loaded()?;
        let before = guard.tasks.len();
        guard.tasks.retain(|task| !task.completed);
        log::debug!("completed tasks cleared removed={}", before - guard.tasks.len());
        Ok(self.dispatch(&guard))
    }

    fn lock_loaded(&self) -> Result<std::sync::MutexGuard<'_, TaskListData>, TaskError> {
        let guard = self.inner.lock().expect("state poisoned");
        if !guard.loaded {
            return Err(TaskError::NotLoaded);
        }
        Ok(guard)
    }

    // Dispatching under the lock keeps persisted snapshots in mutation order.
    fn dispatch(&self, data: &TaskListData) -> Vec<Task> {
        let snapshot = data.tasks.clone();
        self.persister.persist(snapshot.clone());
        snapshot
    }
}

#[derive(Debug)]
struct TaskListData {
    tasks: Vec<Task>,
    loaded: bool,
}

impl TaskListData {
    fn check_index(&self, index: usize) -> Result<(), TaskError> {
        if index >= self.tasks.len() {
            return Err(TaskError::IndexOutOfRange {
                index,
                len: self.tasks.len(),
            });
        }
        Ok(())
    }

    fn task_mut(&mut self, index: usize) -> Result<&mut Task, TaskError> {
        let len = self.tasks.len();
        self.tasks
            .get_mut(index)
            .ok_or(TaskError::IndexOutOfRange { index, len })
    }
}
