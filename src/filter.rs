use crate::model::{Filter, Task, TaskId};

/// The visible subsequence of `tasks` under `filter`, in collection order.
pub fn project(tasks: &[Task], filter: Filter) -> Vec<&Task> {
    tasks.iter().filter(|t| filter.matches(t)).collect()
}

/// Expand a new order for the visible tasks into an order for the whole
/// collection.
///
/// Tasks not in `visible` keep their positions; the positions that held
/// visible tasks are refilled, front to back, with `visible` in its new order.
/// `visible` must be a permutation of the tasks it replaces for the result to
/// be a permutation of `full`.
pub fn merge_visible_order(full: &[TaskId], visible: &[TaskId]) -> Vec<TaskId> {
    let mut replacements = visible.iter().copied();
    full.iter()
        .map(|id| {
            if visible.contains(id) {
                replacements.next().unwrap_or(*id)
            } else {
                *id
            }
        })
        .collect()
}
