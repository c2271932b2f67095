use crate::models::{Task, Theme};

const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Renders the list with 1-based positions, one task per line.
pub fn render_tasks(tasks: &[Task], theme: Theme) -> String {
    if tasks.is_empty() {
        return "No tasks yet.\n".to_string();
    }
    let mut out = String::new();
    for (index, task) in tasks.iter().enumerate() {
        let mark = if task.completed { "x" } else { " " };
        let line = format!(
            "{:>3}. [{mark}] {:<6} {}",
            index + 1,
            task.priority.label(),
            task.name
        );
        match (theme, task.completed) {
            (Theme::Light, _) => out.push_str(&line),
            (Theme::Dark, true) => out.push_str(&format!("{DIM}{line}{RESET}")),
            (Theme::Dark, false) => out.push_str(&format!("{BOLD}{line}{RESET}")),
        }
        out.push('\n');
    }
    out
}
