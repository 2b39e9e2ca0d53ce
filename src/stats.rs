//! Derived counters and the read-only observers that display them.

use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::Task;
use crate::storage::{SlotReader, Storage};

pub const HEADER_REFRESH: Duration = Duration::from_secs(5);
pub const FOOTER_REFRESH: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
    /// Percentage of tasks completed, rounded half up; 0 when there are none.
    pub productivity: u8,
    pub oldest_created: Option<DateTime<Utc>>,
    pub newest_created: Option<DateTime<Utc>>,
}

impl Stats {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let total = tasks.len();
        let completed = tasks.iter().filter(|t| t.completed).count();
        let productivity = if total == 0 {
            0
        } else {
            // round(completed / total * 100) without floats
            ((completed * 200 + total) / (2 * total)) as u8
        };
        Self {
            total,
            active: total - completed,
            completed,
            productivity,
            oldest_created: tasks.iter().map(|t| t.created_at).min(),
            newest_created: tasks.iter().map(|t| t.created_at).max(),
        }
    }
}

/// A header or footer widget's view of the stored collection.
///
/// Observers re-read the persisted slot rather than sharing the store's
/// memory; they refresh when notified, when their interval elapses, or when
/// marked stale by a storage change event.
pub struct StatsObserver<S> {
    reader: SlotReader<S>,
    changes: Option<Receiver<()>>,
    interval: Duration,
    last_refresh: Option<Instant>,
    stale: bool,
    stats: Stats,
}

impl<S: Storage> StatsObserver<S> {
    pub fn new(reader: SlotReader<S>, interval: Duration) -> Self {
        Self {
            reader,
            changes: None,
            interval,
            last_refresh: None,
            stale: true,
            stats: Stats::default(),
        }
    }

    /// Refresh whenever a message arrives on `changes`.
    pub fn with_notifications(mut self, changes: Receiver<()>) -> Self {
        self.changes = Some(changes);
        self
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    /// Re-read the slot now.
    pub fn refresh(&mut self, now: Instant) {
        self.stats = Stats::from_tasks(&self.reader.read_tasks());
        self.last_refresh = Some(now);
        self.stale = false;
    }

    /// Refresh if notified, stale, or due. Returns true if a refresh happened.
    pub fn poll(&mut self, now: Instant) -> bool {
        let notified = self
            .changes
            .as_ref()
            .map(|rx| rx.try_iter().count() > 0)
            .unwrap_or(false);
        let due = self
            .last_refresh
            .map(|at| now.duration_since(at) >= self.interval)
            .unwrap_or(true);
        if notified || due || self.stale {
            self.refresh(now);
            true
        } else {
            false
        }
    }
}
