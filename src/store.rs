//! The task store: sole owner and sole writer of the task collection.
//!
//! Every mutation is applied to a copy of the collection, written to storage,
//! and only then swapped into memory, so a failed write leaves both the slot
//! and the in-memory order untouched. Successful mutations notify every
//! subscriber with a unit message on an mpsc channel.

use std::cell::Cell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::filter;
use crate::model::{Filter, Task, TaskId};
use crate::stats::Stats;
use crate::storage::{self, Storage};
use crate::validate::{validate_text, ValidationError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("new order must list every task exactly once")]
    InvalidOrder,
    #[error("no task ids left; the stored ids have reached the maximum")]
    IdsExhausted,
    #[error("failed to save tasks: {0:#}")]
    Storage(anyhow::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock(Rc<Cell<DateTime<Utc>>>);

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self(Rc::new(Cell::new(start)))
    }

    pub fn advance(&self, by: Duration) {
        self.0.set(self.0.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.0.get()
    }
}

/// Creation-time ids that never go backwards: `max(now_ms, last + 1)`.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    pub fn seeded(tasks: &[Task]) -> Self {
        Self {
            last: tasks.iter().map(|t| t.id.0).max().unwrap_or(0),
        }
    }

    /// `None` once the largest representable id has been handed out.
    pub fn next(&mut self, now: DateTime<Utc>) -> Option<TaskId> {
        let id = now.timestamp_millis().max(self.last.checked_add(1)?);
        self.last = id;
        Some(TaskId(id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptAction {
    Remove(TaskId),
    ClearCompleted { count: usize },
}

/// A pending destructive action awaiting the user's yes/no.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub action: PromptAction,
    pub message: String,
}

pub trait Confirmer {
    fn confirm(&mut self, prompt: &Prompt) -> bool;
}

impl<F: FnMut(&Prompt) -> bool> Confirmer for F {
    fn confirm(&mut self, prompt: &Prompt) -> bool {
        self(prompt)
    }
}

pub struct TaskStore<S, C = SystemClock> {
    storage: S,
    clock: C,
    tasks: Vec<Task>,
    ids: IdGenerator,
    subscribers: Vec<Sender<()>>,
}

impl<S: Storage, C: Clock> TaskStore<S, C> {
    /// Create a store over `storage` and load whatever it holds.
    pub fn open(storage: S, clock: C) -> Self {
        let mut store = Self {
            storage,
            clock,
            tasks: Vec::new(),
            ids: IdGenerator::default(),
            subscribers: Vec::new(),
        };
        store.load();
        store
    }

    /// Replace the in-memory collection with the persisted one. Missing or
    /// malformed data loads as empty.
    pub fn load(&mut self) {
        let mut tasks = storage::read_tasks(&self.storage);
        let mut seen = HashSet::new();
        let before = tasks.len();
        tasks.retain(|t| seen.insert(t.id));
        if tasks.len() != before {
            tracing::warn!(dropped = before - tasks.len(), "duplicate task ids in storage");
        }
        self.ids = IdGenerator::seeded(&tasks);
        tracing::debug!(count = tasks.len(), "loaded tasks");
        self.tasks = tasks;
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn ids(&self) -> Vec<TaskId> {
        self.tasks.iter().map(|t| t.id).collect()
    }

    pub fn project(&self, filter: Filter) -> Vec<&Task> {
        filter::project(&self.tasks, filter)
    }

    pub fn stats(&self) -> Stats {
        Stats::from_tasks(&self.tasks)
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }

    /// Receive a unit message after every successful mutation.
    pub fn subscribe(&mut self) -> Receiver<()> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    fn notify(&mut self) {
        self.subscribers.retain(|tx| tx.send(()).is_ok());
    }

    fn commit(&mut self, next: Vec<Task>) -> StoreResult<()> {
        storage::write_tasks(&self.storage, &next).map_err(|e| {
            tracing::error!(error = %format!("{e:#}"), "failed to save tasks");
            StoreError::Storage(e)
        })?;
        self.tasks = next;
        self.notify();
        Ok(())
    }

    fn position(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    /// Add a task at the front of the collection.
    pub fn add(&mut self, raw: &str) -> StoreResult<TaskId> {
        let text = validate_text(raw)?;
        let now = self.clock.now();
        let id = self.ids.next(now).ok_or(StoreError::IdsExhausted)?;
        let mut next = Vec::with_capacity(self.tasks.len() + 1);
        next.push(Task::new(id, text, now));
        next.extend(self.tasks.iter().cloned());
        self.commit(next)?;
        tracing::info!(%id, "added task");
        Ok(id)
    }

    /// Flip completion. Returns false if no task has `id`.
    pub fn toggle(&mut self, id: TaskId) -> StoreResult<bool> {
        let Some(pos) = self.position(id) else {
            tracing::debug!(%id, "toggle: no such task");
            return Ok(false);
        };
        let now = self.clock.now();
        let mut next = self.tasks.clone();
        let task = &mut next[pos];
        task.completed = !task.completed;
        task.completed_at = task.completed.then_some(now);
        let completed = task.completed;
        self.commit(next)?;
        tracing::info!(%id, completed, "toggled task");
        Ok(true)
    }

    /// Replace a task's text. `None` means the user cancelled the edit.
    /// Returns false when nothing changed because the task is gone or the
    /// edit was cancelled.
    pub fn edit(&mut self, id: TaskId, new_text: Option<&str>) -> StoreResult<bool> {
        let Some(pos) = self.position(id) else {
            tracing::debug!(%id, "edit: no such task");
            return Ok(false);
        };
        let Some(raw) = new_text else {
            return Ok(false);
        };
        let text = validate_text(raw)?;
        let now = self.clock.now();
        let mut next = self.tasks.clone();
        next[pos].text = text;
        next[pos].edited_at = Some(now);
        self.commit(next)?;
        tracing::info!(%id, "edited task");
        Ok(true)
    }

    /// The confirmation needed before deleting `id`, if it exists.
    pub fn removal_prompt(&self, id: TaskId) -> Option<Prompt> {
        self.position(id)?;
        Some(Prompt {
            action: PromptAction::Remove(id),
            message: "Are you sure you want to delete this task?".into(),
        })
    }

    /// The confirmation needed before clearing completed tasks, or `None`
    /// when there are none to clear.
    pub fn clear_completed_prompt(&self) -> Option<Prompt> {
        let count = self.completed_count();
        if count == 0 {
            return None;
        }
        let plural = if count > 1 { "s" } else { "" };
        Some(Prompt {
            action: PromptAction::ClearCompleted { count },
            message: format!("Delete {count} completed task{plural}?"),
        })
    }

    /// Apply an answered prompt. Returns how many tasks were removed.
    pub fn resolve(&mut self, prompt: &Prompt, accepted: bool) -> StoreResult<usize> {
        if !accepted {
            tracing::debug!(?prompt.action, "declined");
            return Ok(0);
        }
        let mut next = self.tasks.clone();
        match prompt.action {
            PromptAction::Remove(id) => next.retain(|t| t.id != id),
            PromptAction::ClearCompleted { .. } => next.retain(|t| !t.completed),
        }
        let removed = self.tasks.len() - next.len();
        if removed == 0 {
            return Ok(0);
        }
        self.commit(next)?;
        tracing::info!(?prompt.action, removed, "removed tasks");
        Ok(removed)
    }

    /// Delete one task after asking `confirmer`. Returns true if it was removed.
    pub fn remove(&mut self, id: TaskId, confirmer: &mut dyn Confirmer) -> StoreResult<bool> {
        let Some(prompt) = self.removal_prompt(id) else {
            return Ok(false);
        };
        let accepted = confirmer.confirm(&prompt);
        Ok(self.resolve(&prompt, accepted)? > 0)
    }

    /// Delete every completed task after asking `confirmer`.
    pub fn clear_completed(&mut self, confirmer: &mut dyn Confirmer) -> StoreResult<usize> {
        let Some(prompt) = self.clear_completed_prompt() else {
            return Ok(0);
        };
        let accepted = confirmer.confirm(&prompt);
        self.resolve(&prompt, accepted)
    }

    /// Reorder the whole collection. `order` must be a permutation of the
    /// current ids; anything else is rejected without change.
    pub fn reorder(&mut self, order: &[TaskId]) -> StoreResult<()> {
        if order.len() != self.tasks.len() {
            return Err(StoreError::InvalidOrder);
        }
        let mut seen = HashSet::with_capacity(order.len());
        let mut next = Vec::with_capacity(order.len());
        for id in order {
            if !seen.insert(*id) {
                return Err(StoreError::InvalidOrder);
            }
            let task = self.get(*id).ok_or(StoreError::InvalidOrder)?;
            next.push(task.clone());
        }
        if next == self.tasks {
            return Ok(());
        }
        self.commit(next)?;
        tracing::info!(count = order.len(), "reordered tasks");
        Ok(())
    }

    /// Move `id` to `position` within the projection for `filter`, clamped
    /// to the last slot. Tasks hidden by the filter keep their positions.
    /// Returns false when the task isn't visible or doesn't move.
    pub fn move_to(&mut self, id: TaskId, filter: Filter, position: usize) -> StoreResult<bool> {
        let mut visible: Vec<TaskId> = self.project(filter).iter().map(|t| t.id).collect();
        let Some(from) = visible.iter().position(|v| *v == id) else {
            return Ok(false);
        };
        let to = position.min(visible.len() - 1);
        if to == from {
            return Ok(false);
        }
        let moved = visible.remove(from);
        visible.insert(to, moved);
        let order = filter::merge_visible_order(&self.ids(), &visible);
        self.reorder(&order)?;
        Ok(true)
    }

    /// Move `id` by `delta` slots within the projection for `filter`.
    pub fn move_visible(&mut self, id: TaskId, filter: Filter, delta: isize) -> StoreResult<bool> {
        let Some(from) = self.project(filter).iter().position(|t| t.id == id) else {
            return Ok(false);
        };
        let Some(to) = from.checked_add_signed(delta) else {
            return Ok(false);
        };
        self.move_to(id, filter, to)
    }
}
