use crate::events::StatePayload;
use crate::models::{PriorityLevel, Settings, Task};
use crate::state::TaskList;
use crate::storage::{StorageError, TaskStore};

#[derive(Debug, serde::Serialize)]
pub struct CommandResult<T> {
    pub ok: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> CommandResult<T> {
    pub fn into_result(self) -> Result<T, String> {
        match (self.data, self.error) {
            (Some(data), None) if self.ok => Ok(data),
            (_, error) => Err(error.unwrap_or_else(|| "unknown error".to_string())),
        }
    }
}

/// Host services the command layer needs from the presentation side.
pub trait CommandCtx {
    fn settings(&self) -> Settings;
    fn save_settings(&self, settings: &Settings) -> Result<(), StorageError>;
    fn emit_state_updated(&self, payload: StatePayload);
}

fn ok<T>(data: T) -> CommandResult<T> {
    CommandResult {
        ok: true,
        data: Some(data),
        error: None,
    }
}

fn err<T>(message: &str) -> CommandResult<T> {
    CommandResult {
        ok: false,
        data: None,
        error: Some(message.to_string()),
    }
}

fn publish(ctx: &impl CommandCtx, tasks: &[Task]) {
    let payload = StatePayload {
        tasks: tasks.to_vec(),
        theme: ctx.settings().theme,
    };
    ctx.emit_state_updated(payload);
}

fn finish<E: std::fmt::Display>(
    ctx: &impl CommandCtx,
    outcome: Result<Vec<Task>, E>,
) -> CommandResult<Vec<Task>> {
    match outcome {
        Ok(tasks) => {
            publish(ctx, &tasks);
            ok(tasks)
        }
        Err(error) => {
            log::warn!("command rejected: {error}");
            err(&error.to_string())
        }
    }
}

pub fn load_state_impl(
    ctx: &impl CommandCtx,
    state: &TaskList,
    store: &TaskStore,
) -> CommandResult<Vec<Task>> {
    finish(ctx, state.load(store))
}

pub fn list_tasks_impl(state: &TaskList) -> CommandResult<Vec<Task>> {
    ok(state.tasks())
}

pub fn add_task_impl(
    ctx: &impl CommandCtx,
    state: &TaskList,
    name: &str,
    priority: PriorityLevel,
) -> CommandResult<Vec<Task>> {
    finish(ctx, state.add_task(name, priority))
}

pub fn toggle_completed_impl(
    ctx: &impl CommandCtx,
    state: &TaskList,
    index: usize,
    completed: Option<bool>,
) -> CommandResult<Vec<Task>> {
    finish(ctx, state.toggle_completed(index, completed))
}

pub fn delete_task_impl(
    ctx: &impl CommandCtx,
    state: &TaskList,
    index: usize,
) -> CommandResult<Vec<Task>> {
    finish(ctx, state.delete_task(index))
}

pub fn change_priority_impl(
    ctx: &impl CommandCtx,
    state: &TaskList,
    index: usize,
    priority: PriorityLevel,
) -> CommandResult<Vec<Task>> {
    finish(ctx, state.change_priority(index, priority))
}

pub fn clear_completed_impl(ctx: &impl CommandCtx, state: &TaskList) -> CommandResult<Vec<Task>> {
    finish(ctx, state.clear_completed())
}

pub fn toggle_theme_impl(ctx: &impl CommandCtx, state: &TaskList) -> CommandResult<Settings> {
    let mut settings = ctx.settings();
    settings.theme = settings.theme.toggled();
    if let Err(error) = ctx.save_settings(&settings) {
        return err(&format!("storage error: {error}"));
    }
    publish(ctx, &state.tasks());
    ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Theme;
    use crate::persist::InlinePersister;
    use crate::storage::{MemoryStore, SettingsStore};
    use std::sync::{Arc, Mutex};

    struct TestCtx {
        settings: SettingsStore,
        settings_error: Option<String>,
        emitted: Mutex<Vec<StatePayload>>,
    }

    impl TestCtx {
        fn new() -> Self {
            Self {
                settings: SettingsStore::new(Arc::new(MemoryStore::new())),
                settings_error: None,
                emitted: Mutex::new(Vec::new()),
            }
        }

        fn with_settings_error(message: &str) -> Self {
            let mut ctx = Self::new();
            ctx.settings_error = Some(message.to_string());
            ctx
        }

        fn emitted_count(&self) -> usize {
            self.emitted.lock().unwrap().len()
        }

        fn last_emitted(&self) -> StatePayload {
            self.emitted.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl CommandCtx for TestCtx {
        fn settings(&self) -> Settings {
            self.settings.load()
        }

        fn save_settings(&self, settings: &Settings) -> Result<(), StorageError> {
            if let Some(message) = &self.settings_error {
                return Err(StorageError::Io(std::io::Error::other(message.clone())));
            }
            self.settings.save(settings)
        }

        fn emit_state_updated(&self, payload: StatePayload) {
            self.emitted.lock().unwrap().push(payload);
        }
    }

    fn make_state() -> (TaskList, TaskStore) {
        let store = TaskStore::new(Arc::new(MemoryStore::new()));
        let persister = Arc::new(InlinePersister::new(store.clone()));
        (TaskList::new(persister), store)
    }

    fn loaded_state(ctx: &TestCtx) -> (TaskList, TaskStore) {
        let (state, store) = make_state();
        let r = load_state_impl(ctx, &state, &store);
        assert!(r.ok);
        (state, store)
    }

    #[test]
    fn ok_and_err_helpers_construct_expected_shape() {
        let r = ok(123);
        assert!(r.ok);
        assert_eq!(r.data, Some(123));
        assert_eq!(r.error, None);
        assert_eq!(r.into_result(), Ok(123));

        let r: CommandResult<i32> = err("nope");
        assert!(!r.ok);
        assert_eq!(r.data, None);
        assert_eq!(r.error.as_deref(), Some("nope"));
        assert_eq!(r.into_result(), Err("nope".to_string()));
    }

    #[test]
    fn command_result_serializes_like_the_json_envelope() {
        let value = serde_json::to_value(err::<Vec<Task>>("boom")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "ok": false, "data": null, "error": "boom" })
        );
    }

    #[test]
    fn load_state_reads_store_and_emits() {
        let ctx = TestCtx::new();
        let (state, store) = make_state();
        store
            .save(&[
                Task::new("later", PriorityLevel::Low),
                Task::new("now", PriorityLevel::High),
            ])
            .unwrap();

        let r = load_state_impl(&ctx, &state, &store);
        assert!(r.ok);
        let tasks = r.data.unwrap();
        assert_eq!(tasks[0].name, "now");
        assert_eq!(ctx.emitted_count(), 1);
        assert_eq!(ctx.last_emitted().tasks, tasks);

        let again = load_state_impl(&ctx, &state, &store);
        assert!(!again.ok);
        assert_eq!(again.error.as_deref(), Some("task list already loaded"));
    }

    #[test]
    fn mutating_commands_persist_and_emit_updated_list() {
        let ctx = TestCtx::new();
        let (state, store) = loaded_state(&ctx);

        add_task_impl(&ctx, &state, "Buy milk", PriorityLevel::Medium);
        add_task_impl(&ctx, &state, "Fix bug", PriorityLevel::High);
        let r = add_task_impl(&ctx, &state, "Water plants", PriorityLevel::Low);
        let names: Vec<String> = r.data.unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["Fix bug", "Buy milk", "Water plants"]);

        let r = toggle_completed_impl(&ctx, &state, 2, Some(true));
        assert!(r.data.unwrap()[2].completed);

        let r = change_priority_impl(&ctx, &state, 1, PriorityLevel::Low);
        let tasks = r.data.unwrap();
        assert_eq!(tasks[1].name, "Buy milk");
        assert_eq!(tasks[1].priority, PriorityLevel::Low);

        let r = clear_completed_impl(&ctx, &state);
        assert_eq!(r.data.unwrap().len(), 2);

        let r = delete_task_impl(&ctx, &state, 0);
        let tasks = r.data.unwrap();
        assert_eq!(tasks.len(), 1);

        assert_eq!(store.load(), tasks);
        assert_eq!(ctx.last_emitted().tasks, tasks);
        assert_eq!(ctx.emitted_count(), 8);
        assert_eq!(list_tasks_impl(&state).data, Some(tasks));
    }

    #[test]
    fn out_of_range_commands_return_errors_without_emitting() {
        let ctx = TestCtx::new();
        let (state, store) = loaded_state(&ctx);
        add_task_impl(&ctx, &state, "only", PriorityLevel::Medium);
        let emitted = ctx.emitted_count();

        let r = delete_task_impl(&ctx, &state, 5);
        assert!(!r.ok);
        assert_eq!(r.error.as_deref(), Some("index out of range: 5 (len 1)"));
        assert!(!toggle_completed_impl(&ctx, &state, 1, Some(true)).ok);
        assert!(!change_priority_impl(&ctx, &state, 9, PriorityLevel::High).ok);

        assert_eq!(ctx.emitted_count(), emitted);
        assert_eq!(store.load().len(), 1);
    }

    #[test]
    fn commands_before_load_are_rejected() {
        let ctx = TestCtx::new();
        let (state, _store) = make_state();
        let r = add_task_impl(&ctx, &state, "early", PriorityLevel::High);
        assert!(!r.ok);
        assert_eq!(r.error.as_deref(), Some("task list not loaded yet"));
        assert_eq!(ctx.emitted_count(), 0);
    }

    #[test]
    fn toggle_theme_persists_and_carries_theme_in_payload() {
        let ctx = TestCtx::new();
        let (state, _store) = loaded_state(&ctx);
        assert_eq!(ctx.last_emitted().theme, Theme::Light);

        let r = toggle_theme_impl(&ctx, &state);
        assert_eq!(r.data.unwrap().theme, Theme::Dark);
        assert_eq!(ctx.settings().theme, Theme::Dark);
        assert_eq!(ctx.last_emitted().theme, Theme::Dark);

        let r = toggle_theme_impl(&ctx, &state);
        assert_eq!(r.data.unwrap().theme, Theme::Light);
    }

    #[test]
    fn toggle_theme_reports_storage_errors() {
        let ctx = TestCtx::with_settings_error("disk full");
        let (state, _store) = loaded_state(&ctx);
        let r = toggle_theme_impl(&ctx, &state);
        assert!(!r.ok);
        assert!(r.error.unwrap().contains("disk full"));
        assert_eq!(ctx.settings().theme, Theme::Light);
    }
}
