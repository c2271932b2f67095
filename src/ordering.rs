use std::cmp::{Ordering, Reverse};

use crate::models::Task;

type SortKey = (Reverse<u8>, bool, String);

fn sort_key(task: &Task) -> SortKey {
    (
        Reverse(task.priority.weight()),
        task.completed,
        task.name.to_lowercase(),
    )
}

/// Global task order: heavier priority first, then incomplete before completed, then
/// name ignoring case.
pub fn compare_tasks(a: &Task, b: &Task) -> Ordering {
    sort_key(a).cmp(&sort_key(b))
}

/// Fully re-sorts `tasks`. Stable, so tasks with identical keys keep their order.
pub fn sort_tasks(tasks: &mut [Task]) {
    tasks.sort_by_cached_key(sort_key);
}

pub fn is_sorted(tasks: &[Task]) -> bool {
    tasks
        .windows(2)
        .all(|pair| compare_tasks(&pair[0], &pair[1]) != Ordering::Greater)
}
