//! Command-line front end. Renders the list after each command.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::commands::*;
use crate::config::AppConfig;
use crate::events::StatePayload;
use crate::logging::init_logging;
use crate::models::{default_new_priority, PriorityLevel, Settings, Task};
use crate::persist::BackgroundPersister;
use crate::render::render_tasks;
use crate::state::TaskList;
use crate::storage::{FileStore, KeyValueStore, SettingsStore, StorageError, TaskStore};

#[derive(Parser)]
#[command(name = "taskpad")]
#[command(version)]
#[command(about = "Prioritized task list with local persistence")]
pub struct Cli {
    /// Directory holding tasks, settings and logs
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
    /// Print the JSON command envelope instead of the rendered list
    #[arg(long, global = true)]
    pub json: bool,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the ordered task list
    List,
    /// Add a task
    Add {
        /// Task name; words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
        /// low, medium or high
        #[arg(short, long, default_value_t = default_new_priority())]
        priority: PriorityLevel,
    },
    /// Check or uncheck the task at a position
    Toggle {
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        position: u64,
    },
    /// Delete the task at a position
    Delete {
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        position: u64,
    },
    /// Change the priority of the task at a position
    Priority {
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        position: u64,
        priority: PriorityLevel,
    },
    /// Remove every completed task
    Clear,
    /// Switch between the light and dark theme
    Theme,
}

struct CliCtx {
    settings: SettingsStore,
    json: bool,
    render: bool,
}

impl CommandCtx for CliCtx {
    fn settings(&self) -> Settings {
        self.settings.load()
    }

    fn save_settings(&self, settings: &Settings) -> Result<(), StorageError> {
        self.settings.save(settings)
    }

    fn emit_state_updated(&self, payload: StatePayload) {
        if self.render {
            print!("{}", render_tasks(&payload.tasks, payload.theme));
        }
    }
}

// Positions are 1-based on the command line; clap guarantees `position >= 1`. Values
// that do not fit in usize become an index the list is guaranteed to reject.
fn to_index(position: u64) -> usize {
    usize::try_from(position - 1).unwrap_or(usize::MAX)
}

/// Checkbox semantics: flip the current value. `None` (no task at the position) stays
/// `None` and the list rejects the index.
fn next_completed(current: Option<bool>) -> Option<bool> {
    current.map(|completed| !completed)
}

fn print_json<T: serde::Serialize>(result: &CommandResult<T>) {
    match serde_json::to_string_pretty(result) {
        Ok(json) => println!("{json}"),
        Err(error) => eprintln!("json error: {error}"),
    }
}

fn report<T: serde::Serialize>(ctx: &CliCtx, result: CommandResult<T>) -> bool {
    let success = result.ok;
    if ctx.json {
        print_json(&result);
    } else if let Some(error) = &result.error {
        eprintln!("error: {error}");
    }
    success
}

fn dispatch(ctx: &CliCtx, state: &TaskList, command: Commands) -> bool {
    match command {
        Commands::List => {
            let result = list_tasks_impl(state);
            if !ctx.json {
                print!("{}", render_tasks(&state.tasks(), ctx.settings().theme));
            }
            report(ctx, result)
        }
        Commands::Add { name, priority } => {
            report(ctx, add_task_impl(ctx, state, &name.join(" "), priority))
        }
        Commands::Toggle { position } => {
            let index = to_index(position);
            let current = state.tasks().get(index).map(|task: &Task| task.completed);
            report(
                ctx,
                toggle_completed_impl(ctx, state, index, next_completed(current)),
            )
        }
        Commands::Delete { position } => {
            report(ctx, delete_task_impl(ctx, state, to_index(position)))
        }
        Commands::Priority { position, priority } => report(
            ctx,
            change_priority_impl(ctx, state, to_index(position), priority),
        ),
        Commands::Clear => report(ctx, clear_completed_impl(ctx, state)),
        Commands::Theme => report(ctx, toggle_theme_impl(ctx, state)),
    }
}

/// Parses arguments, runs one command and waits for its write. Returns the exit code.
pub fn run() -> i32 {
    let cli = Cli::parse();
    let config = match AppConfig::resolve(cli.data_dir.clone()) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("error: {error}");
            return 2;
        }
    };
    let _logger = match init_logging(&config.data_dir, &config.log_spec) {
        Ok(handle) => Some(handle),
        Err(error) => {
            eprintln!("warning: logging disabled: {error}");
            None
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => {
            log::error!("failed to start runtime: {error}");
            eprintln!("error: {error}");
            return 1;
        }
    };

    let success = runtime.block_on(async move {
        let backend: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(config.data_dir.clone()));
        let task_store = TaskStore::new(backend.clone());
        let persister = BackgroundPersister::spawn(task_store.clone());
        let state = TaskList::new(persister.clone());
        let settings = SettingsStore::new(backend);

        // The load itself is not rendered; only the command's result is.
        let loading = CliCtx {
            settings: settings.clone(),
            json: cli.json,
            render: false,
        };
        let ctx = CliCtx {
            settings,
            json: cli.json,
            render: !cli.json,
        };
        let loaded = load_state_impl(&loading, &state, &task_store);
        if !loaded.ok {
            return report(&ctx, loaded);
        }

        let success = dispatch(&ctx, &state, cli.command.unwrap_or(Commands::List));
        persister.flush().await;
        log::debug!("command finished success={success}");
        success
    });
    if success {
        0
    } else {
        1
    }
}
