mod cli;

use std::io::{self, Write as _};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;

use cli::{Cli, Command};
use taskmaster::config::{Config, Overrides, Settings};
use taskmaster::model::TaskId;
use taskmaster::storage::FileStorage;
use taskmaster::store::{Prompt, SystemClock, TaskStore};
use taskmaster::{output, render, tui};

type Store = TaskStore<FileStorage, SystemClock>;

fn open_store(settings: &Settings) -> Store {
    TaskStore::open(FileStorage::new(&settings.data_dir), SystemClock)
}

/// Ask on stderr/stdin; anything but an explicit yes declines.
fn ask(prompt: &Prompt) -> bool {
    eprint!("{} [y/N] ", prompt.message);
    let _ = io::stderr().flush();
    let mut line = String::new();
    if io::stdin().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim(), "y" | "Y" | "yes")
}

/// Initialize file-based logging.
///
/// The TUI owns the terminal, so logs always go to a file. The returned guard
/// must be held until exit so buffered lines are flushed.
fn init_logging(level: &str, log_path: &Path) -> Option<WorkerGuard> {
    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let settings = Settings::resolve(
        Overrides {
            data_dir: cli.data_dir,
            log_level: cli.log_level,
            log_file: cli.log_file,
        },
        config,
    );
    let _log_guard = init_logging(&settings.log_level, &settings.log_file);
    tracing::debug!(data_dir = %settings.data_dir.display(), "starting");

    dispatch(&settings, cli.command.unwrap_or(Command::Ui))
}

fn dispatch(settings: &Settings, command: Command) -> Result<()> {
    match command {
        Command::Ui => {
            tui::run(settings)?;
        }

        Command::Add { text } => {
            let mut store = open_store(settings);
            let id = store.add(&text)?;
            println!("{id}");
            eprintln!("Added task {id}");
        }

        Command::Toggle { id } => {
            let mut store = open_store(settings);
            let id = TaskId(id);
            if store.toggle(id)? {
                let state = store.get(id).map(|t| t.status_str()).unwrap_or("active");
                eprintln!("Marked task {id} {state}");
            } else {
                eprintln!("no task with id {id}");
            }
        }

        Command::Edit { id, text } => {
            let mut store = open_store(settings);
            let id = TaskId(id);
            if store.edit(id, Some(&text))? {
                eprintln!("Updated task {id}");
            } else {
                eprintln!("no task with id {id}");
            }
        }

        Command::Show { id } => {
            let store = open_store(settings);
            match store.get(TaskId(id)) {
                Some(task) => print!("{}", output::format_task_detail(task)),
                None => eprintln!("no task with id {id}"),
            }
        }

        Command::Rm { id, yes } => {
            let mut store = open_store(settings);
            let id = TaskId(id);
            if store.get(id).is_none() {
                eprintln!("no task with id {id}");
            } else if store.remove(id, &mut |p: &Prompt| yes || ask(p))? {
                eprintln!("Removed task {id}");
            } else {
                eprintln!("Kept task {id}");
            }
        }

        Command::ClearCompleted { yes } => {
            let mut store = open_store(settings);
            if store.completed_count() == 0 {
                eprintln!("No completed tasks");
            } else {
                let removed = store.clear_completed(&mut |p: &Prompt| yes || ask(p))?;
                eprintln!("Removed {removed} completed task(s)");
            }
        }

        Command::Mv {
            id,
            position,
            filter,
        } => {
            let mut store = open_store(settings);
            let id = TaskId(id);
            if store.move_to(id, filter, position)? {
                eprintln!("Moved task {id} to position {position}");
            } else if store.project(filter).iter().any(|t| t.id == id) {
                eprintln!("Task {id} already at position {position}");
            } else {
                eprintln!("no task with id {id} in the {filter} view");
            }
        }

        Command::List { filter, json } => {
            let store = open_store(settings);
            if json {
                let list = output::TaskList {
                    filter: filter.as_str(),
                    tasks: store.project(filter),
                };
                println!("{}", serde_json::to_string_pretty(&list)?);
            } else {
                print!("{}", output::format_task_list(store.tasks(), filter));
            }
        }

        Command::Stats { json } => {
            let store = open_store(settings);
            let stats = store.stats();
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print!("{}", output::format_stats(&stats));
            }
        }

        Command::ExportHtml { filter } => {
            let store = open_store(settings);
            let view = render::render(store.tasks(), filter);
            io::stdout()
                .write_all(render::render_html(&view).as_bytes())
                .context("failed to write HTML")?;
        }
    }

    Ok(())
}
