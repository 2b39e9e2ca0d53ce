use serde::Serialize;

use crate::model::{format_timestamp, Filter, Task};
use crate::render::{self, Body};
use crate::stats::Stats;

#[derive(Serialize)]
pub struct TaskList<'a> {
    pub filter: &'a str,
    pub tasks: Vec<&'a Task>,
}

pub fn format_task_detail(task: &Task) -> String {
    let mut out = String::new();
    out.push_str(&format!("Id:        {}\n", task.id));
    out.push_str(&format!("Text:      {}\n", render::escape_text(&task.text)));
    out.push_str(&format!("Status:    {}\n", task.status_str()));
    out.push_str(&format!("Created:   {}\n", format_timestamp(&task.created_at)));
    if let Some(ref at) = task.completed_at {
        out.push_str(&format!("Completed: {}\n", format_timestamp(at)));
    }
    if let Some(ref at) = task.edited_at {
        out.push_str(&format!("Edited:    {}\n", format_timestamp(at)));
    }
    out
}

/// One line per visible task, or the empty-state text.
pub fn format_task_list(tasks: &[Task], filter: Filter) -> String {
    let view = render::render(tasks, filter);
    let mut out = String::new();
    match &view.body {
        Body::Empty(empty) => {
            out.push_str(&format!("{}\n{}\n", empty.title, empty.subtitle));
        }
        Body::Rows(rows) => {
            for row in rows {
                let icon = if row.completed { "[x]" } else { "[ ]" };
                out.push_str(&format!("{icon} {:>13}  {}\n", row.id, row.text));
            }
        }
    }
    out
}

pub fn format_stats(stats: &Stats) -> String {
    let mut out = String::new();
    out.push_str(&format!("Total:        {}\n", stats.total));
    out.push_str(&format!("Active:       {}\n", stats.active));
    out.push_str(&format!("Completed:    {}\n", stats.completed));
    out.push_str(&format!("Productivity: {}%\n", stats.productivity));
    if let Some(ref at) = stats.oldest_created {
        out.push_str(&format!("Oldest:       {}\n", format_timestamp(at)));
    }
    if let Some(ref at) = stats.newest_created {
        out.push_str(&format!("Newest:       {}\n", format_timestamp(at)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TaskId;
    use chrono::{TimeZone, Utc};

    fn make_task(id: i64, text: &str, completed: bool) -> Task {
        let mut task = Task::new(
            TaskId(id),
            text.to_string(),
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        );
        task.completed = completed;
        task
    }

    #[test]
    fn flat_list() {
        let tasks = vec![make_task(2, "Walk dog", false), make_task(1, "Buy milk", true)];
        let out = format_task_list(&tasks, Filter::All);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[ ]"));
        assert!(lines[0].ends_with("Walk dog"));
        assert!(lines[1].starts_with("[x]"));
    }

    #[test]
    fn filtered_empty_list_shows_empty_state() {
        let tasks = vec![make_task(1, "open", false)];
        let out = format_task_list(&tasks, Filter::Completed);
        assert!(out.starts_with(render::EMPTY_TITLE));
    }

    #[test]
    fn list_escapes_control_characters() {
        let tasks = vec![make_task(1, "evil\x1b[2J", false)];
        let out = format_task_list(&tasks, Filter::All);
        assert!(!out.contains('\x1b'));
    }

    #[test]
    fn detail_includes_optional_timestamps() {
        let mut task = make_task(1, "t", true);
        task.completed_at = Some(Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap());
        let out = format_task_detail(&task);
        assert!(out.contains("Status:    completed"));
        assert!(out.contains("Completed: 2025-01-02T00:00:00.000Z"));
        assert!(!out.contains("Edited:"));
    }

    #[test]
    fn stats_block() {
        let tasks = vec![make_task(2, "a", false), make_task(1, "b", true)];
        let out = format_stats(&Stats::from_tasks(&tasks));
        assert!(out.contains("Total:        2"));
        assert!(out.contains("Productivity: 50%"));
    }
}
