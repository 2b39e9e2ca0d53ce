use std::path::Path;
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Creates a watcher for the task slot file and returns a receiver for change
/// events. The watcher must be kept alive for events to be received.
///
/// Writes go through a temp file that is renamed over the slot, so we watch
/// the parent directory and filter to events naming the slot file itself.
pub fn watch_slot(slot_path: &Path) -> Result<(RecommendedWatcher, Receiver<()>)> {
    let (tx, rx) = mpsc::channel();

    let slot_name = slot_path
        .file_name()
        .map(|f| f.to_os_string())
        .unwrap_or_default();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if let Ok(event) = res {
            // Reads by other instances fire access events; ignore them.
            if matches!(event.kind, EventKind::Access(_)) {
                return;
            }
            let ours = event
                .paths
                .iter()
                .any(|p| p.file_name().map(|f| f == slot_name).unwrap_or(false));
            if ours {
                let _ = tx.send(());
            }
        }
    })
    .context("failed to create file watcher")?;

    let watch_path = slot_path.parent().unwrap_or(slot_path);
    if !watch_path.exists() {
        std::fs::create_dir_all(watch_path)
            .with_context(|| format!("failed to create directory {}", watch_path.display()))?;
    }
    watcher
        .watch(watch_path, RecursiveMode::NonRecursive)
        .with_context(|| format!("failed to watch {}", watch_path.display()))?;

    Ok((watcher, rx))
}

/// Waits for a slot change event with timeout.
/// Returns true if an event was received, false on timeout.
pub fn wait_for_change(rx: &Receiver<()>, timeout: Duration) -> bool {
    rx.recv_timeout(timeout).is_ok()
}

/// Drains any pending events from the receiver.
pub fn drain_events(rx: &Receiver<()>) {
    while rx.try_recv().is_ok() {}
}
