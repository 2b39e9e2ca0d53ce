//! Display model for the task list.
//!
//! Task text only reaches a display through [`escape_text`] (terminal) or
//! [`escape_html`] (HTML export); it is never spliced into output raw.

use std::borrow::Cow;
use std::fmt::Write as _;

use crate::filter;
use crate::model::{Filter, Task, TaskId};

pub const EMPTY_TITLE: &str = "No tasks yet!";
pub const EMPTY_SUBTITLE: &str = "Add your first task to get started";

/// Control characters plus the bidi marks, embeddings, overrides and
/// isolates that can visually reorder a line.
fn is_unsafe_on_terminal(c: char) -> bool {
    c.is_control()
        || matches!(
            c,
            '\u{061C}' | '\u{200E}' | '\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2066}'..='\u{2069}'
        )
}

/// Make `raw` inert on a terminal: control characters (including ESC, so no
/// escape sequences survive) and bidi formatting characters are replaced by
/// visible `\u{..}` escapes.
pub fn escape_text(raw: &str) -> Cow<'_, str> {
    if !raw.chars().any(is_unsafe_on_terminal) {
        return Cow::Borrowed(raw);
    }
    let mut out = String::with_capacity(raw.len() + 8);
    for c in raw.chars() {
        if is_unsafe_on_terminal(c) {
            let _ = write!(out, "\\u{{{:x}}}", c as u32);
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

/// Escape the characters HTML gives meaning to.
pub fn escape_html(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(raw);
    }
    let mut out = String::with_capacity(raw.len() + 16);
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// One displayed task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
    /// Edit stays available on completed tasks but is drawn de-emphasized.
    pub edit_dimmed: bool,
    pub draggable: bool,
}

impl RowView {
    pub fn from_task(task: &Task) -> Self {
        Self {
            id: task.id,
            text: escape_text(&task.text).into_owned(),
            completed: task.completed,
            edit_dimmed: task.completed,
            draggable: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyState {
    pub title: &'static str,
    pub subtitle: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Empty(EmptyState),
    Rows(Vec<RowView>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearCompleted {
    pub enabled: bool,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListView {
    pub filter: Filter,
    pub body: Body,
    pub clear_completed: ClearCompleted,
}

impl ListView {
    pub fn rows(&self) -> &[RowView] {
        match &self.body {
            Body::Rows(rows) => rows,
            Body::Empty(_) => &[],
        }
    }

    pub fn visible_ids(&self) -> Vec<TaskId> {
        self.rows().iter().map(|r| r.id).collect()
    }
}

/// Build the list view for `tasks` under `filter`. The clear-completed
/// control reflects the whole collection, not just the visible rows.
pub fn render(tasks: &[Task], filter: Filter) -> ListView {
    let visible = filter::project(tasks, filter);
    let body = if visible.is_empty() {
        Body::Empty(EmptyState {
            title: EMPTY_TITLE,
            subtitle: EMPTY_SUBTITLE,
        })
    } else {
        Body::Rows(visible.into_iter().map(RowView::from_task).collect())
    };
    let completed = tasks.iter().filter(|t| t.completed).count();
    ListView {
        filter,
        body,
        clear_completed: ClearCompleted {
            enabled: completed > 0,
            label: format!("Clear Completed ({completed})"),
        },
    }
}

/// A standalone HTML page listing the visible tasks.
pub fn render_html(view: &ListView) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>My Tasks</title></head>\n<body>\n");
    out.push_str("<h2>My Tasks</h2>\n");
    match &view.body {
        Body::Empty(empty) => {
            let _ = writeln!(
                out,
                "<div class=\"empty-state\"><div>{}</div><div>{}</div></div>",
                escape_html(empty.title),
                escape_html(empty.subtitle)
            );
        }
        Body::Rows(rows) => {
            out.push_str("<ul class=\"task-list\">\n");
            for row in rows {
                let class = if row.completed { "task-item completed" } else { "task-item" };
                let checked = if row.completed { " checked" } else { "" };
                let _ = writeln!(
                    out,
                    "  <li class=\"{class}\" data-task-id=\"{}\"><input type=\"checkbox\" disabled{checked}> <span class=\"task-text\">{}</span></li>",
                    row.id,
                    escape_html(&row.text)
                );
            }
            out.push_str("</ul>\n");
        }
    }
    out.push_str("</body>\n</html>\n");
    out
}
