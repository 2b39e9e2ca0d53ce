use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Tabs, Wrap};

use super::app::{App, Mode};
use crate::model::Filter;
use crate::render::{Body, RowView};
use crate::storage::Storage;
use crate::store::Clock;
use crate::validate::MAX_TEXT_LEN;

const APP_TITLE: &str = " To Do List App ";
const FOOTER_BRAND: &str = "TaskMaster Pro";
const INPUT_PLACEHOLDER: &str = "What needs to be done?";

pub fn render<S: Storage + Clone, C: Clock>(frame: &mut Frame, app: &mut App<S, C>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_input(frame, app, chunks[1]);
    render_filters(frame, app, chunks[2]);
    render_list(frame, app, chunks[3]);
    render_footer(frame, app, chunks[4]);

    match &app.mode {
        Mode::Confirm(prompt) => render_confirm(frame, &prompt.message),
        Mode::Notice { message, .. } => render_notice(frame, message),
        Mode::Edit(_) => render_edit(frame, &app.edit_buf),
        Mode::Help => render_help(frame),
        Mode::Normal | Mode::Input => {}
    }
}

fn render_header<S: Storage + Clone, C: Clock>(frame: &mut Frame, app: &App<S, C>, area: Rect) {
    let stats = app.header.stats();
    let line = Line::from(vec![
        Span::raw("Total: "),
        Span::styled(stats.total.to_string(), Style::default().bold()),
        Span::raw("   Active: "),
        Span::styled(stats.active.to_string(), Style::default().fg(Color::Yellow).bold()),
        Span::raw("   Done: "),
        Span::styled(stats.completed.to_string(), Style::default().fg(Color::Green).bold()),
    ]);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(APP_TITLE)
        .border_style(Style::default().fg(Color::Cyan));
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_input<S: Storage + Clone, C: Clock>(frame: &mut Frame, app: &App<S, C>, area: Rect) {
    let focused = app.mode == Mode::Input;
    let count = app.input.chars().count();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" New task (i) ")
        .title_top(Line::from(format!(" {count}/{MAX_TEXT_LEN} ")).right_aligned())
        .border_style(if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        });
    let inner = block.inner(area);

    let text = if app.input.is_empty() && !focused {
        Line::styled(INPUT_PLACEHOLDER, Style::default().fg(Color::DarkGray))
    } else {
        Line::raw(visible_tail(&app.input, inner.width.saturating_sub(1) as usize))
    };
    frame.render_widget(Paragraph::new(text).block(block), area);

    if focused {
        let shown = app.input.chars().count().min(inner.width.saturating_sub(1) as usize);
        frame.set_cursor_position((inner.x + shown as u16, inner.y));
    }
}

/// The last `width` characters of `s`, so the cursor end stays in view.
fn visible_tail(s: &str, width: usize) -> String {
    let len = s.chars().count();
    s.chars().skip(len.saturating_sub(width)).collect()
}

fn render_filters<S: Storage + Clone, C: Clock>(frame: &mut Frame, app: &App<S, C>, area: Rect) {
    let titles: Vec<Line> = Filter::ALL
        .iter()
        .enumerate()
        .map(|(i, f)| Line::from(format!("{} {}", i + 1, f.label())))
        .collect();
    let selected = Filter::ALL.iter().position(|f| *f == app.filter).unwrap_or(0);
    let tabs = Tabs::new(titles)
        .select(selected)
        .highlight_style(Style::default().fg(Color::Cyan).bold().underlined())
        .divider(" | ");
    frame.render_widget(tabs, area);
}

fn render_list<S: Storage + Clone, C: Clock>(frame: &mut Frame, app: &mut App<S, C>, area: Rect) {
    let clear = &app.view.clear_completed;
    let clear_style = if clear.enabled {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" My Tasks ")
        .title_top(Line::styled(format!(" {} (C) ", clear.label), clear_style).right_aligned());
    app.list_area = block.inner(area);

    if let Body::Empty(empty) = &app.view.body {
        let text = vec![
            Line::raw(""),
            Line::styled(empty.title, Style::default().bold()),
            Line::styled(empty.subtitle, Style::default().fg(Color::DarkGray)),
        ];
        frame.render_widget(
            Paragraph::new(text).alignment(Alignment::Center).block(block),
            area,
        );
        return;
    }

    let dragged = app.drag.dragged();
    let selected = app.selected_id();
    let rows = app.view.rows();
    let items: Vec<ListItem> = app
        .display_order()
        .into_iter()
        .filter_map(|id| rows.iter().find(|r| r.id == id))
        .map(|row| {
            let item = ListItem::new(row_line(row, Some(row.id) == selected));
            if Some(row.id) == dragged {
                item.style(Style::default().fg(Color::Yellow).bold())
            } else {
                item
            }
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray));
    frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn row_line(row: &RowView, selected: bool) -> Line<'static> {
    let (check, check_style) = if row.completed {
        ("[x] ", Style::default().fg(Color::Green))
    } else {
        ("[ ] ", Style::default())
    };
    let text_style = if row.completed {
        Style::default().fg(Color::DarkGray).crossed_out()
    } else {
        Style::default()
    };
    let mut spans = vec![
        Span::styled(
            if row.draggable { "⠿ " } else { "  " },
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(check, check_style),
        Span::styled(row.text.clone(), text_style),
    ];
    if selected {
        let edit_style = if row.edit_dimmed {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::Cyan)
        };
        spans.push(Span::raw("  "));
        spans.push(Span::styled("e:edit", edit_style));
        spans.push(Span::styled(" d:delete", Style::default().fg(Color::Red)));
    }
    Line::from(spans)
}

fn render_footer<S: Storage + Clone, C: Clock>(frame: &mut Frame, app: &App<S, C>, area: Rect) {
    let stats = app.footer.stats();
    let line = Line::from(vec![
        Span::styled(FOOTER_BRAND, Style::default().fg(Color::Cyan).bold()),
        Span::raw(format!(" │ Tasks: {} │ Done: {}% │ ", stats.total, stats.productivity)),
        Span::styled("?:help  q:quit", Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Center a rectangle within an area.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

fn dialog(frame: &mut Frame, title: &str, color: Color, height: u16) -> Rect {
    let term = frame.area();
    let width = 50.min(term.width.saturating_sub(4));
    let height = height.min(term.height.saturating_sub(2));
    let area = centered_rect(width, height, term);
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {title} "))
        .border_style(Style::default().fg(color));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    inner
}

fn render_confirm(frame: &mut Frame, message: &str) {
    let inner = dialog(frame, "Confirm", Color::Yellow, 5);
    let text = vec![
        Line::raw(message.to_string()),
        Line::raw(""),
        Line::from(vec![
            Span::raw("Proceed? "),
            Span::styled("y", Style::default().fg(Color::Green).bold()),
            Span::raw("/"),
            Span::styled("n", Style::default().fg(Color::Red).bold()),
        ]),
    ];
    frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: false }), inner);
}

fn render_notice(frame: &mut Frame, message: &str) {
    let inner = dialog(frame, "Notice", Color::Red, 6);
    let text = vec![
        Line::styled(message.to_string(), Style::default().bold()),
        Line::raw(""),
        Line::styled("Press any key", Style::default().fg(Color::DarkGray)),
    ];
    frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: false }), inner);
}

fn render_edit(frame: &mut Frame, buf: &str) {
    let inner = dialog(frame, "Edit task", Color::Cyan, 5);
    let width = inner.width.saturating_sub(1) as usize;
    let text = vec![
        Line::raw(visible_tail(buf, width)),
        Line::raw(""),
        Line::styled("Enter: save  Esc: cancel  C-u: clear", Style::default().fg(Color::DarkGray)),
    ];
    frame.render_widget(Paragraph::new(text), inner);
    let shown = buf.chars().count().min(width);
    frame.set_cursor_position((inner.x + shown as u16, inner.y));
}

fn render_help(frame: &mut Frame) {
    let inner = dialog(frame, "Help", Color::Cyan, 17);
    let entries = [
        ("i/a     ", "Type a new task (Enter adds, Esc leaves)"),
        ("j/Down  ", "Move down"),
        ("k/Up    ", "Move up"),
        ("Space   ", "Toggle completed"),
        ("e       ", "Edit task"),
        ("d       ", "Delete task"),
        ("C       ", "Clear completed tasks"),
        ("1/2/3   ", "Show all/active/completed"),
        ("Tab     ", "Next filter"),
        ("J/K     ", "Move task down/up"),
        ("mouse   ", "Drag a row to reorder"),
        ("r       ", "Reload from disk"),
        ("?       ", "Toggle help"),
        ("q/Esc   ", "Quit"),
    ];
    let lines: Vec<Line> = entries
        .iter()
        .map(|(key, desc)| {
            Line::from(vec![
                Span::styled(*key, Style::default().fg(Color::Cyan)),
                Span::raw(*desc),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}
