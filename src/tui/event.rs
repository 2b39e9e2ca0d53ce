use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use super::app::{App, Mode};
use crate::model::Filter;
use crate::storage::Storage;
use crate::store::Clock;

/// Result of handling a key press.
#[derive(Debug, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    Continue,
}

/// Handle a key press. Returns an action indicating what the event loop should do.
pub fn handle_key<S: Storage + Clone, C: Clock>(app: &mut App<S, C>, key: KeyEvent) -> KeyAction {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return KeyAction::Quit;
    }

    match &app.mode {
        Mode::Notice { .. } => {
            app.dismiss_notice();
            KeyAction::Continue
        }
        Mode::Confirm(_) => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.answer(true),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.answer(false),
                _ => {}
            }
            KeyAction::Continue
        }
        Mode::Help => {
            app.toggle_help();
            KeyAction::Continue
        }
        Mode::Input => {
            handle_input(app, key);
            KeyAction::Continue
        }
        Mode::Edit(_) => {
            handle_edit(app, key);
            KeyAction::Continue
        }
        Mode::Normal => handle_normal(app, key),
    }
}

fn handle_normal<S: Storage + Clone, C: Clock>(app: &mut App<S, C>, key: KeyEvent) -> KeyAction {
    // While a row is held only cancelling or quitting is allowed.
    if app.drag.is_dragging() {
        match key.code {
            KeyCode::Esc => app.cancel_drag(),
            KeyCode::Char('q') => return KeyAction::Quit,
            _ => {}
        }
        return KeyAction::Continue;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return KeyAction::Quit,
        KeyCode::Char('i') | KeyCode::Char('a') => app.mode = Mode::Input,
        KeyCode::Char('j') | KeyCode::Down => app.move_down(),
        KeyCode::Char('k') | KeyCode::Up => app.move_up(),
        KeyCode::Char(' ') => app.toggle_selected(),
        KeyCode::Char('e') => app.begin_edit(),
        KeyCode::Char('d') | KeyCode::Delete => app.request_delete(),
        KeyCode::Char('C') => app.request_clear_completed(),
        KeyCode::Char('1') => app.set_filter(Filter::All),
        KeyCode::Char('2') => app.set_filter(Filter::Active),
        KeyCode::Char('3') => app.set_filter(Filter::Completed),
        KeyCode::Tab => app.set_filter(app.filter.next()),
        KeyCode::Char('J') => app.move_selected(1),
        KeyCode::Char('K') => app.move_selected(-1),
        KeyCode::Char('r') => app.reload(),
        KeyCode::Char('?') => app.toggle_help(),
        _ => {}
    }
    KeyAction::Continue
}

fn handle_input<S: Storage + Clone, C: Clock>(app: &mut App<S, C>, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.mode = Mode::Normal,
        KeyCode::Enter => app.submit_add(),
        KeyCode::Backspace => {
            app.input.pop();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => app.input.clear(),
        KeyCode::Char(c) => app.push_input(c),
        _ => {}
    }
}

fn handle_edit<S: Storage + Clone, C: Clock>(app: &mut App<S, C>, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_edit(),
        KeyCode::Enter => app.submit_edit(),
        KeyCode::Backspace => {
            app.edit_buf.pop();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => app.edit_buf.clear(),
        KeyCode::Char(c) => app.edit_buf.push(c),
        _ => {}
    }
}

/// Handle a mouse event: left-button drags reorder rows, the wheel moves
/// the cursor.
pub fn handle_mouse<S: Storage + Clone, C: Clock>(app: &mut App<S, C>, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => app.pointer_down(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => app.pointer_drag(mouse.row),
        MouseEventKind::Up(MouseButton::Left) => app.pointer_up(),
        MouseEventKind::ScrollDown if app.mode == Mode::Normal => app.move_down(),
        MouseEventKind::ScrollUp if app.mode == Mode::Normal => app.move_up(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::store::SystemClock;
    use ratatui::layout::Rect;
    use std::time::Duration;

    type TestApp = App<MemoryStorage, SystemClock>;

    fn app() -> TestApp {
        App::new(
            MemoryStorage::new(),
            SystemClock,
            Duration::from_secs(5),
            Duration::from_secs(3),
        )
    }

    fn press(app: &mut TestApp, code: KeyCode) -> KeyAction {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_str(app: &mut TestApp, s: &str) {
        for c in s.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn texts(app: &TestApp) -> Vec<String> {
        app.view.rows().iter().map(|r| r.text.clone()).collect()
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn typing_in_input_does_not_trigger_commands() {
        let mut app = app();
        press(&mut app, KeyCode::Char('i'));
        type_str(&mut app, "qdC?");
        assert_eq!(app.mode, Mode::Input);
        assert_eq!(app.input, "qdC?");
        press(&mut app, KeyCode::Enter);
        assert_eq!(texts(&app), vec!["qdC?"]);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, Mode::Normal);
    }

    #[test]
    fn buy_milk_walk_dog_session() {
        let mut app = app();
        press(&mut app, KeyCode::Char('a'));
        type_str(&mut app, "Buy milk");
        press(&mut app, KeyCode::Enter);
        type_str(&mut app, "Walk dog");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Esc);
        assert_eq!(texts(&app), vec!["Walk dog", "Buy milk"]);

        // Complete "Buy milk"
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(texts(&app), vec!["Walk dog"]);
        press(&mut app, KeyCode::Char('3'));
        assert_eq!(texts(&app), vec!["Buy milk"]);

        press(&mut app, KeyCode::Char('C'));
        assert!(matches!(app.mode, Mode::Confirm(_)));
        press(&mut app, KeyCode::Char('y'));
        assert!(app.view.rows().is_empty());
        press(&mut app, KeyCode::Char('1'));
        assert_eq!(texts(&app), vec!["Walk dog"]);
    }

    #[test]
    fn declined_delete_keeps_task() {
        let mut app = app();
        press(&mut app, KeyCode::Char('i'));
        type_str(&mut app, "keep me");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(texts(&app), vec!["keep me"]);
        assert_eq!(app.mode, Mode::Normal);
    }

    #[test]
    fn notice_dismissed_by_any_key() {
        let mut app = app();
        press(&mut app, KeyCode::Char('i'));
        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.mode, Mode::Notice { .. }));
        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.mode, Mode::Input);
        assert!(app.input.is_empty());
    }

    #[test]
    fn edit_via_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Char('i'));
        type_str(&mut app, "typo");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('e'));
        press(&mut app, KeyCode::Backspace);
        type_str(&mut app, "e");
        press(&mut app, KeyCode::Enter);
        assert_eq!(texts(&app), vec!["type"]);
    }

    #[test]
    fn tab_cycles_filters() {
        let mut app = app();
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.filter, Filter::Active);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.filter, Filter::Completed);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.filter, Filter::All);
    }

    #[test]
    fn shift_j_moves_task_down() {
        let mut app = app();
        press(&mut app, KeyCode::Char('i'));
        type_str(&mut app, "b");
        press(&mut app, KeyCode::Enter);
        type_str(&mut app, "a");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('J'));
        assert_eq!(texts(&app), vec!["b", "a"]);
        assert_eq!(app.cursor, 1);
    }

    #[test]
    fn quit_and_help() {
        let mut app = app();
        press(&mut app, KeyCode::Char('?'));
        assert_eq!(app.mode, Mode::Help);
        assert_eq!(press(&mut app, KeyCode::Char('q')), KeyAction::Continue);
        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(press(&mut app, KeyCode::Char('q')), KeyAction::Quit);
    }

    #[test]
    fn esc_cancels_drag_before_quitting() {
        let mut app = app();
        press(&mut app, KeyCode::Char('i'));
        type_str(&mut app, "b");
        press(&mut app, KeyCode::Enter);
        type_str(&mut app, "a");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Esc);
        app.list_area = Rect::new(0, 0, 20, 5);

        handle_mouse(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 1, 0));
        handle_mouse(&mut app, mouse(MouseEventKind::Drag(MouseButton::Left), 1, 1));
        assert_eq!(press(&mut app, KeyCode::Esc), KeyAction::Continue);
        assert!(!app.drag.is_dragging());
        assert_eq!(texts(&app), vec!["a", "b"]);
        assert_eq!(press(&mut app, KeyCode::Esc), KeyAction::Quit);
    }

    #[test]
    fn keys_other_than_cancel_ignored_while_dragging() {
        let mut app = app();
        press(&mut app, KeyCode::Char('i'));
        type_str(&mut app, "b");
        press(&mut app, KeyCode::Enter);
        type_str(&mut app, "a");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Esc);
        app.list_area = Rect::new(0, 0, 20, 5);

        handle_mouse(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 1, 0));
        for code in [KeyCode::Char('d'), KeyCode::Char(' '), KeyCode::Char('C'), KeyCode::Char('i')] {
            assert_eq!(press(&mut app, code), KeyAction::Continue);
        }
        assert_eq!(app.mode, Mode::Normal);
        assert!(app.drag.is_dragging());
        assert!(app.view.rows().iter().all(|r| !r.completed));

        handle_mouse(&mut app, mouse(MouseEventKind::Drag(MouseButton::Left), 1, 1));
        handle_mouse(&mut app, mouse(MouseEventKind::Up(MouseButton::Left), 1, 1));
        assert_eq!(texts(&app), vec!["b", "a"]);
        assert_eq!(app.mode, Mode::Normal);
    }

    #[test]
    fn mouse_drag_and_release_commits() {
        let mut app = app();
        press(&mut app, KeyCode::Char('i'));
        type_str(&mut app, "b");
        press(&mut app, KeyCode::Enter);
        type_str(&mut app, "a");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Esc);
        app.list_area = Rect::new(0, 0, 20, 5);

        handle_mouse(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 1, 0));
        handle_mouse(&mut app, mouse(MouseEventKind::Drag(MouseButton::Left), 1, 1));
        handle_mouse(&mut app, mouse(MouseEventKind::Up(MouseButton::Left), 1, 1));
        assert_eq!(texts(&app), vec!["b", "a"]);
    }
}
