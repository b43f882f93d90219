// src/mailbox.rs

use anyhow::{Context, Result};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing::debug;

/// Named key/value handoff between pipeline stages. A stage publishes its
/// whole output under `(task_id, key)`; the next stage pulls it by name.
pub trait Mailbox: Send + Sync {
    fn push(&self, task_id: &str, key: &str, value: String) -> Result<()>;

    /// `Ok(None)` when nothing was ever published under that name.
    fn pull(&self, task_id: &str, key: &str) -> Result<Option<String>>;
}

/// Mailbox kept in process memory, for single-process runs.
#[derive(Default)]
pub struct MemoryMailbox {
    slots: Mutex<HashMap<(String, String), String>>,
}

impl MemoryMailbox {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Mailbox for MemoryMailbox {
    fn push(&self, task_id: &str, key: &str, value: String) -> Result<()> {
        self.slots
            .lock()
            .map_err(|_| anyhow::anyhow!("mailbox lock poisoned"))?
            .insert((task_id.to_string(), key.to_string()), value);
        Ok(())
    }

    fn pull(&self, task_id: &str, key: &str) -> Result<Option<String>> {
        Ok(self
            .slots
            .lock()
            .map_err(|_| anyhow::anyhow!("mailbox lock poisoned"))?
            .get(&(task_id.to_string(), key.to_string()))
            .cloned())
    }
}

/// Mailbox stored as `<dir>/<task_id>/<key>.json`, so stages run as separate
/// processes can hand data to each other.
pub struct DirMailbox {
    dir: PathBuf,
}

impl DirMailbox {
    /// Open a mailbox at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).with_context(|| format!("creating mailbox directory {:?}", &dir))?;
        Ok(Self { dir })
    }

    fn slot_path(&self, task_id: &str, key: &str) -> PathBuf {
        self.dir.join(task_id).join(format!("{}.json", key))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Mailbox for DirMailbox {
    fn push(&self, task_id: &str, key: &str, value: String) -> Result<()> {
        let path = self.slot_path(task_id, key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
        }
        fs::write(&path, value).with_context(|| format!("writing mailbox slot {:?}", &path))?;
        debug!(path = %path.display(), "published");
        Ok(())
    }

    fn pull(&self, task_id: &str, key: &str) -> Result<Option<String>> {
        let path = self.slot_path(task_id, key);
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .with_context(|| format!("reading mailbox slot {:?}", &path))
    }
}
