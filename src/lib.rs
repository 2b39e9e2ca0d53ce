pub mod config;
pub mod drag;
pub mod filter;
pub mod model;
pub mod output;
pub mod render;
pub mod stats;
pub mod storage;
pub mod store;
pub mod tui;
pub mod validate;
pub mod watch;
