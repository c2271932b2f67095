use std::fmt;
use std::sync::Arc;

use crate::models::{Task, Theme};
use crate::storage::StorageError;

/// Everything a renderer needs after a state change.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StatePayload {
    pub tasks: Vec<Task>,
    pub theme: Theme,
}

/// A storage failure that was recovered from locally instead of returned to the caller.
#[derive(Debug)]
pub enum StoreFailure {
    Decode(StorageError),
    Persist(StorageError),
}

impl fmt::Display for StoreFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreFailure::Decode(err) => write!(f, "load failed: {err}"),
            StoreFailure::Persist(err) => write!(f, "persist failed: {err}"),
        }
    }
}

/// Opt-in observer for failures that are otherwise only logged.
pub type FailureHook = Arc<dyn Fn(&StoreFailure) + Send + Sync>;

pub(crate) fn report_failure(hook: Option<&FailureHook>, failure: StoreFailure) {
    log::warn!("storage failure swallowed: {failure}");
    if let Some(hook) = hook {
        hook(&failure);
    }
}
