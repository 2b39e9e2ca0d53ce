//! Local key-value persistence for the task collection.
//!
//! Each key is a single JSON document. The task slot is overwritten wholesale
//! on every mutation and re-read in full at startup; a missing or unreadable
//! slot is indistinguishable from a fresh install.

use std::collections::HashMap;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};

use crate::model::Task;

/// Storage key holding the serialized task collection.
pub const TASKS_KEY: &str = "todoTasks";

pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// One file per key under `dir`, named `<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if !self.dir.exists() {
            std::fs::create_dir_all(&self.dir)
                .with_context(|| format!("failed to create directory {}", self.dir.display()))?;
        }
        let path = self.path_for(key);
        // Write next to the target and rename so readers never see a torn file.
        let mut tmp = tempfile::Builder::new()
            .prefix(&format!(".{key}-"))
            .suffix(".tmp")
            .tempfile_in(&self.dir)
            .context("failed to create temp file")?;
        tmp.write_all(value.as_bytes())
            .context("failed to write to temp file")?;
        tmp.flush()?;
        tmp.persist(&path)
            .with_context(|| format!("failed to replace {}", path.display()))?;
        Ok(())
    }
}

/// In-process storage. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: Arc<Mutex<HashMap<String, String>>>,
    read_only: Arc<AtomicBool>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes fail, e.g. to simulate a full disk.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let slots = self
            .slots
            .lock()
            .map_err(|_| anyhow::anyhow!("storage lock poisoned"))?;
        Ok(slots.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.read_only.load(Ordering::SeqCst) {
            bail!("storage is read-only");
        }
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| anyhow::anyhow!("storage lock poisoned"))?;
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Read the task collection. Absent, unreadable, or malformed data yields an
/// empty collection.
pub fn read_tasks<S: Storage + ?Sized>(storage: &S) -> Vec<Task> {
    let raw = match storage.get(TASKS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "failed to read task slot; starting empty");
            return Vec::new();
        }
    };
    let records: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(error = %e, "malformed task slot; starting empty");
            return Vec::new();
        }
    };
    // One bad record must not cost the rest of the collection.
    records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value::<Task>(record) {
            Ok(task) => Some(task),
            Err(e) => {
                tracing::warn!(index, error = %e, "skipping malformed task record");
                None
            }
        })
        .collect()
}

pub fn write_tasks<S: Storage + ?Sized>(storage: &S, tasks: &[Task]) -> Result<()> {
    let raw = serde_json::to_string(tasks).context("failed to serialize tasks")?;
    storage.set(TASKS_KEY, &raw)
}

/// Read-only handle on the task slot, given to stats observers.
#[derive(Debug, Clone)]
pub struct SlotReader<S> {
    storage: S,
}

impl<S: Storage> SlotReader<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn read_tasks(&self) -> Vec<Task> {
        read_tasks(&self.storage)
    }
}
