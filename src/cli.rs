use std::path::PathBuf;

use clap::{Parser, Subcommand};

use taskmaster::model::Filter;

#[derive(Parser)]
#[command(name = "taskmaster", about = "Personal task list for the terminal")]
pub struct Cli {
    /// Directory holding the task data [default: ~/.taskmaster]
    #[arg(long, env = "TASKMASTER_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Config file [default: ~/.taskmaster/config.toml]
    #[arg(long, env = "TASKMASTER_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log level or filter directive (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log file [default: $TMPDIR/taskmaster.log]
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Launch the interactive task list (default)
    Ui,

    /// Add a task at the top of the list
    Add {
        /// Task text (1-200 characters)
        text: String,
    },

    /// Toggle a task between active and completed
    Toggle {
        /// Task id
        id: i64,
    },

    /// Change a task's text
    Edit {
        /// Task id
        id: i64,
        /// New text (1-200 characters)
        text: String,
    },

    /// Show task details
    Show {
        /// Task id
        id: i64,
    },

    /// Delete a task
    Rm {
        /// Task id
        id: i64,
        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete all completed tasks
    ClearCompleted {
        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Move a task to a position in the list
    Mv {
        /// Task id
        id: i64,
        /// Zero-based target position within the filtered list
        position: usize,
        /// Positions are counted within this view
        #[arg(long, value_enum, default_value = "all")]
        filter: Filter,
    },

    /// List tasks
    List {
        /// Which tasks to show
        #[arg(long, value_enum, default_value = "all")]
        filter: Filter,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show task counts and completion rate
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the task list as a standalone HTML page to stdout
    ExportHtml {
        /// Which tasks to include
        #[arg(long, value_enum, default_value = "all")]
        filter: Filter,
    },
}
