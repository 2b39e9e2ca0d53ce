use std::time::Instant;

use ratatui::layout::Rect;
use ratatui::widgets::ListState;

use crate::drag::{self, DragController};
use crate::filter;
use crate::model::{Filter, TaskId};
use crate::render::{self, ListView, RowView};
use crate::stats::StatsObserver;
use crate::storage::{SlotReader, Storage};
use crate::store::{Clock, Prompt, StoreError, TaskStore};
use crate::validate::MAX_TEXT_LEN;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Normal,
    /// Typing a new task into the input line.
    Input,
    /// Editing the text of an existing task.
    Edit(TaskId),
    Confirm(Prompt),
    /// A blocking message; any key returns to `resume`.
    Notice {
        message: String,
        resume: Box<Mode>,
    },
    Help,
}

pub struct App<S, C> {
    pub store: TaskStore<S, C>,
    pub filter: Filter,
    pub view: ListView,
    pub cursor: usize,
    pub list_state: ListState,
    pub mode: Mode,
    pub input: String,
    pub edit_buf: String,
    pub drag: DragController,
    pub header: StatsObserver<S>,
    pub footer: StatsObserver<S>,
    /// Inner area of the task list as last drawn, for mouse hit-testing.
    pub list_area: Rect,
}

impl<S: Storage + Clone, C: Clock> App<S, C> {
    pub fn new(
        storage: S,
        clock: C,
        header_refresh: std::time::Duration,
        footer_refresh: std::time::Duration,
    ) -> Self {
        let mut store = TaskStore::open(storage.clone(), clock);
        let header = StatsObserver::new(SlotReader::new(storage.clone()), header_refresh)
            .with_notifications(store.subscribe());
        let footer = StatsObserver::new(SlotReader::new(storage), footer_refresh)
            .with_notifications(store.subscribe());
        let view = render::render(store.tasks(), Filter::All);
        let mut app = Self {
            store,
            filter: Filter::All,
            view,
            cursor: 0,
            list_state: ListState::default(),
            mode: Mode::Normal,
            input: String::new(),
            edit_buf: String::new(),
            drag: DragController::new(),
            header,
            footer,
            list_area: Rect::default(),
        };
        app.clamp_cursor();
        app
    }

    /// Rebuild the list view from the store and current filter.
    pub fn rerender(&mut self) {
        self.view = render::render(self.store.tasks(), self.filter);
        self.clamp_cursor();
    }

    pub fn clamp_cursor(&mut self) {
        let len = self.view.rows().len();
        if len == 0 {
            self.cursor = 0;
            self.list_state.select(None);
        } else {
            if self.cursor >= len {
                self.cursor = len - 1;
            }
            self.list_state.select(Some(self.cursor));
        }
    }

    /// Refresh the header and footer counters if they're due.
    pub fn tick(&mut self, now: Instant) {
        self.header.poll(now);
        self.footer.poll(now);
    }

    /// The task slot changed on disk (possibly written by another instance).
    pub fn storage_changed(&mut self) {
        self.header.mark_stale();
        self.footer.mark_stale();
    }

    pub fn move_up(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.list_state.select(Some(self.cursor));
        }
    }

    pub fn move_down(&mut self) {
        let len = self.view.rows().len();
        if len > 0 && self.cursor < len - 1 {
            self.cursor += 1;
            self.list_state.select(Some(self.cursor));
        }
    }

    pub fn selected(&self) -> Option<&RowView> {
        self.view.rows().get(self.cursor)
    }

    pub fn selected_id(&self) -> Option<TaskId> {
        self.selected().map(|r| r.id)
    }

    fn select_id(&mut self, id: TaskId) {
        if let Some(pos) = self.view.rows().iter().position(|r| r.id == id) {
            self.cursor = pos;
            self.list_state.select(Some(pos));
        }
    }

    pub fn set_filter(&mut self, filter: Filter) {
        if self.filter != filter {
            self.filter = filter;
            self.cursor = 0;
            self.rerender();
        }
    }

    fn notice(&mut self, message: String, resume: Mode) {
        self.mode = Mode::Notice {
            message,
            resume: Box::new(resume),
        };
    }

    fn report(&mut self, err: StoreError, resume: Mode) {
        tracing::debug!(error = %err, "operation rejected");
        self.notice(err.to_string(), resume);
    }

    pub fn dismiss_notice(&mut self) {
        if !matches!(self.mode, Mode::Notice { .. }) {
            return;
        }
        if let Mode::Notice { resume, .. } = std::mem::replace(&mut self.mode, Mode::Normal) {
            self.mode = *resume;
        }
    }

    pub fn push_input(&mut self, c: char) {
        if self.input.chars().count() < MAX_TEXT_LEN {
            self.input.push(c);
        }
    }

    pub fn submit_add(&mut self) {
        match self.store.add(&self.input) {
            Ok(id) => {
                self.input.clear();
                self.rerender();
                self.select_id(id);
            }
            Err(e) => self.report(e, Mode::Input),
        }
    }

    pub fn toggle_selected(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };
        match self.store.toggle(id) {
            Ok(_) => self.rerender(),
            Err(e) => self.report(e, Mode::Normal),
        }
    }

    pub fn begin_edit(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };
        if let Some(task) = self.store.get(id) {
            self.edit_buf = task.text.clone();
            self.mode = Mode::Edit(id);
        }
    }

    pub fn submit_edit(&mut self) {
        let Mode::Edit(id) = self.mode else {
            return;
        };
        match self.store.edit(id, Some(&self.edit_buf)) {
            Ok(_) => {
                self.edit_buf.clear();
                self.mode = Mode::Normal;
                self.rerender();
            }
            Err(e) => self.report(e, Mode::Edit(id)),
        }
    }

    pub fn cancel_edit(&mut self) {
        self.edit_buf.clear();
        self.mode = Mode::Normal;
    }

    pub fn request_delete(&mut self) {
        if let Some(prompt) = self.selected_id().and_then(|id| self.store.removal_prompt(id)) {
            self.mode = Mode::Confirm(prompt);
        }
    }

    pub fn request_clear_completed(&mut self) {
        if let Some(prompt) = self.store.clear_completed_prompt() {
            self.mode = Mode::Confirm(prompt);
        }
    }

    pub fn answer(&mut self, accepted: bool) {
        if !matches!(self.mode, Mode::Confirm(_)) {
            return;
        }
        let Mode::Confirm(prompt) = std::mem::replace(&mut self.mode, Mode::Normal) else {
            return;
        };
        match self.store.resolve(&prompt, accepted) {
            Ok(_) => self.rerender(),
            Err(e) => self.report(e, Mode::Normal),
        }
    }

    pub fn move_selected(&mut self, delta: isize) {
        let Some(id) = self.selected_id() else {
            return;
        };
        match self.store.move_visible(id, self.filter, delta) {
            Ok(true) => {
                self.rerender();
                self.select_id(id);
            }
            Ok(false) => {}
            Err(e) => self.report(e, Mode::Normal),
        }
    }

    /// Discard in-memory state and re-read the task slot.
    pub fn reload(&mut self) {
        self.store.load();
        self.drag.cancel();
        self.rerender();
        self.storage_changed();
    }

    pub fn toggle_help(&mut self) {
        self.mode = match self.mode {
            Mode::Help => Mode::Normal,
            _ => Mode::Help,
        };
    }

    // ── Pointer drag ────────────────────────────────────────────────────

    /// Visible ids in display order, following the live drag order if any.
    pub fn display_order(&self) -> Vec<TaskId> {
        match self.drag.live_order() {
            Some(order) => order.to_vec(),
            None => self.view.visible_ids(),
        }
    }

    /// The row index under screen line `y`, if any.
    pub fn row_at(&self, column: u16, y: u16) -> Option<usize> {
        let area = self.list_area;
        if column < area.x || column >= area.x + area.width || y < area.y || y >= area.y + area.height {
            return None;
        }
        let index = (y - area.y) as usize + self.list_state.offset();
        (index < self.view.rows().len()).then_some(index)
    }

    pub fn pointer_down(&mut self, column: u16, y: u16) {
        if self.mode != Mode::Normal {
            return;
        }
        let Some(index) = self.row_at(column, y) else {
            return;
        };
        let order = self.view.visible_ids();
        let id = order[index];
        self.cursor = index;
        self.list_state.select(Some(index));
        self.drag.start(id, order);
    }

    pub fn pointer_drag(&mut self, y: u16) {
        let (Some(dragged), Some(order)) = (self.drag.dragged(), self.drag.live_order()) else {
            return;
        };
        // Lay out the other rows as if the dragged one were lifted out of the
        // list; the pointer's line is where it will land.
        let others: Vec<TaskId> = order.iter().copied().filter(|id| *id != dragged).collect();
        let top = self.list_area.y as f64 - self.list_state.offset() as f64;
        let rows = drag::stacked_rows(others, top, 1.0);
        if self.drag.hover(f64::from(y), &rows) {
            if let Some(pos) = self.drag.live_order().and_then(|o| o.iter().position(|id| *id == dragged)) {
                self.cursor = pos;
                self.list_state.select(Some(pos));
            }
        }
    }

    pub fn pointer_up(&mut self) {
        let Some(visible) = self.drag.drop() else {
            return;
        };
        // Tasks removed while the gesture was in flight drop out of the order.
        let current = self.store.ids();
        let visible: Vec<TaskId> = visible.into_iter().filter(|id| current.contains(id)).collect();
        let order = filter::merge_visible_order(&self.store.ids(), &visible);
        if let Err(e) = self.store.reorder(&order) {
            self.report(e, Mode::Normal);
        }
        self.rerender();
    }

    pub fn cancel_drag(&mut self) {
        self.drag.cancel();
        self.rerender();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::store::PromptAction;
    use crate::store::SystemClock;
    use std::time::Duration;

    fn app() -> App<MemoryStorage, SystemClock> {
        App::new(
            MemoryStorage::new(),
            SystemClock,
            Duration::from_secs(5),
            Duration::from_secs(3),
        )
    }

    fn texts(app: &App<MemoryStorage, SystemClock>) -> Vec<String> {
        app.view.rows().iter().map(|r| r.text.clone()).collect()
    }

    fn add(app: &mut App<MemoryStorage, SystemClock>, text: &str) {
        app.input = text.to_string();
        app.submit_add();
    }

    #[test]
    fn add_selects_new_task_at_top() {
        let mut app = app();
        add(&mut app, "one");
        add(&mut app, "two");
        assert_eq!(texts(&app), vec!["two", "one"]);
        assert_eq!(app.cursor, 0);
        assert!(app.input.is_empty());
    }

    #[test]
    fn invalid_add_shows_notice_and_keeps_input() {
        let mut app = app();
        app.mode = Mode::Input;
        add(&mut app, "   ");
        match &app.mode {
            Mode::Notice { message, resume } => {
                assert_eq!(message, "Please enter a task!");
                assert_eq!(**resume, Mode::Input);
            }
            other => panic!("expected notice, got {other:?}"),
        }
        assert_eq!(app.input, "   ");
        app.dismiss_notice();
        assert_eq!(app.mode, Mode::Input);
    }

    #[test]
    fn input_is_capped_at_max_length() {
        let mut app = app();
        for _ in 0..MAX_TEXT_LEN + 10 {
            app.push_input('x');
        }
        assert_eq!(app.input.chars().count(), MAX_TEXT_LEN);
    }

    #[test]
    fn filter_change_rerenders_without_persisting() {
        let mut app = app();
        add(&mut app, "a");
        add(&mut app, "b");
        app.toggle_selected();
        app.set_filter(Filter::Completed);
        assert_eq!(texts(&app), vec!["b"]);
        app.set_filter(Filter::Active);
        assert_eq!(texts(&app), vec!["a"]);
        assert_eq!(app.view.clear_completed.label, "Clear Completed (1)");
    }

    #[test]
    fn delete_goes_through_confirmation() {
        let mut app = app();
        add(&mut app, "a");
        app.request_delete();
        assert!(matches!(
            &app.mode,
            Mode::Confirm(Prompt { action: PromptAction::Remove(_), .. })
        ));
        app.answer(false);
        assert_eq!(texts(&app), vec!["a"]);

        app.request_delete();
        app.answer(true);
        assert!(app.view.rows().is_empty());
        assert_eq!(app.mode, Mode::Normal);
    }

    #[test]
    fn clear_completed_without_completed_tasks_does_nothing() {
        let mut app = app();
        add(&mut app, "a");
        app.request_clear_completed();
        assert_eq!(app.mode, Mode::Normal);
    }

    #[test]
    fn edit_round_trip_and_cancel() {
        let mut app = app();
        add(&mut app, "old");
        app.begin_edit();
        assert_eq!(app.edit_buf, "old");
        app.edit_buf = "new".into();
        app.submit_edit();
        assert_eq!(texts(&app), vec!["new"]);

        app.begin_edit();
        app.edit_buf = "discarded".into();
        app.cancel_edit();
        assert_eq!(texts(&app), vec!["new"]);
        assert_eq!(app.mode, Mode::Normal);
    }

    #[test]
    fn blank_edit_is_rejected_and_resumes_editing() {
        let mut app = app();
        add(&mut app, "keep");
        app.begin_edit();
        app.edit_buf = "  ".into();
        app.submit_edit();
        assert!(matches!(app.mode, Mode::Notice { .. }));
        app.dismiss_notice();
        assert!(matches!(app.mode, Mode::Edit(_)));
        assert_eq!(texts(&app), vec!["keep"]);
    }

    #[test]
    fn header_and_footer_follow_mutations() {
        let mut app = app();
        let now = Instant::now();
        app.tick(now);
        add(&mut app, "a");
        add(&mut app, "b");
        app.toggle_selected();
        app.tick(now);
        assert_eq!(app.header.stats().total, 2);
        assert_eq!(app.header.stats().completed, 1);
        assert_eq!(app.footer.stats().productivity, 50);
    }

    #[test]
    fn mouse_drag_reorders_store() {
        let mut app = app();
        add(&mut app, "c");
        add(&mut app, "b");
        add(&mut app, "a");
        app.list_area = Rect::new(0, 5, 40, 10);

        // Grab "a" (line 5) and drag it to line 7 (last slot)
        app.pointer_down(2, 5);
        assert!(app.drag.is_dragging());
        app.pointer_drag(6);
        app.pointer_drag(7);
        let live: Vec<_> = app
            .display_order()
            .iter()
            .map(|id| app.store.get(*id).unwrap().text.clone())
            .collect();
        assert_eq!(live, vec!["b", "c", "a"]);
        app.pointer_up();
        assert_eq!(texts(&app), vec!["b", "c", "a"]);
        let stored: Vec<_> = app.store.tasks().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(stored, vec!["b", "c", "a"]);
    }

    #[test]
    fn cancelled_drag_restores_store_order() {
        let mut app = app();
        add(&mut app, "b");
        add(&mut app, "a");
        app.list_area = Rect::new(0, 0, 40, 10);
        app.pointer_down(0, 0);
        app.pointer_drag(1);
        app.cancel_drag();
        assert_eq!(texts(&app), vec!["a", "b"]);
        assert!(!app.drag.is_dragging());
    }

    #[test]
    fn drag_in_filtered_view_keeps_hidden_tasks() {
        let mut app = app();
        add(&mut app, "x");
        add(&mut app, "hidden");
        add(&mut app, "y");
        // order: y, hidden, x
        app.cursor = 1;
        app.toggle_selected();
        app.set_filter(Filter::Active);
        assert_eq!(texts(&app), vec!["y", "x"]);

        app.list_area = Rect::new(0, 0, 40, 10);
        app.pointer_down(0, 1);
        app.pointer_drag(0);
        app.pointer_up();
        assert_eq!(texts(&app), vec!["x", "y"]);
        let stored: Vec<_> = app.store.tasks().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(stored, vec!["x", "hidden", "y"]);
    }

    #[test]
    fn drop_after_dragged_task_deleted_is_quiet() {
        let mut app = app();
        add(&mut app, "b");
        add(&mut app, "a");
        app.list_area = Rect::new(0, 0, 40, 10);

        app.pointer_down(0, 0);
        app.request_delete();
        app.answer(true);
        app.pointer_drag(0);
        app.pointer_up();

        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(texts(&app), vec!["b"]);
        assert!(!app.drag.is_dragging());
    }

    #[test]
    fn pointer_outside_list_is_ignored() {
        let mut app = app();
        add(&mut app, "a");
        app.list_area = Rect::new(0, 5, 40, 10);
        app.pointer_down(0, 2);
        assert!(!app.drag.is_dragging());
        app.pointer_down(0, 9);
        assert!(!app.drag.is_dragging());
    }
}
