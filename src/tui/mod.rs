mod app;
mod event;
mod view;

use std::io;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self as ct_event, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::prelude::*;

use crate::config::Settings;
use crate::storage::{FileStorage, TASKS_KEY};
use crate::store::SystemClock;
use crate::watch;
use app::App;
use event::KeyAction;

pub fn run(settings: &Settings) -> Result<()> {
    let storage = FileStorage::new(&settings.data_dir);
    let slot = storage.path_for(TASKS_KEY);
    let mut app = App::new(
        storage,
        SystemClock,
        settings.header_refresh,
        settings.footer_refresh,
    );
    tracing::info!(path = %slot.display(), tasks = app.store.tasks().len(), "starting ui");

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, &mut app, &slot, settings.tick);

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<FileStorage, SystemClock>,
    slot: &std::path::Path,
    tick: Duration,
) -> Result<()> {
    // Set up file watcher
    let (_watcher, rx) = watch::watch_slot(slot)?;

    loop {
        app.tick(Instant::now());
        terminal.draw(|frame| view::render(frame, app))?;

        if ct_event::poll(tick)? {
            match ct_event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if event::handle_key(app, key) == KeyAction::Quit {
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) => event::handle_mouse(app, mouse),
                _ => {}
            }
        }

        // Check for file changes (non-blocking)
        if watch::wait_for_change(&rx, Duration::ZERO) {
            watch::drain_events(&rx);
            tracing::debug!("task slot changed on disk");
            app.storage_changed();
        }
    }
}
