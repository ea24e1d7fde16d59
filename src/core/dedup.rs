//! Persisted set of entry ids that finished the pipeline.
//!
//! The store is the only owner of the downloaded-id set. State lives in
//! `<download_dir>/.downloaded.json` as `{"video_ids": [...]}` with ids sorted.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, WatchError};

pub const STATE_FILE_NAME: &str = ".downloaded.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    video_ids: Vec<Value>,
}

/// Numeric ids written by other tools are kept as their decimal text
fn id_from_value(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        other => {
            log::warn!("Ignoring unexpected id in download state: {}", other);
            None
        }
    }
}

#[derive(Debug)]
pub struct DedupStore {
    path: PathBuf,
    ids: BTreeSet<String>,
}

impl DedupStore {
    /// Empty store persisting to `path`; nothing is read
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            ids: BTreeSet::new(),
        }
    }

    /// Load the state file kept inside `download_dir`
    pub fn load_from_dir(download_dir: &Path) -> Self {
        Self::load(download_dir.join(STATE_FILE_NAME))
    }

    /// Load persisted ids.
    ///
    /// A missing file is an empty store; unreadable or malformed content is also
    /// an empty store, with a warning.
    pub fn load(path: PathBuf) -> Self {
        let mut store = Self::new(path);
        match store.read_ids() {
            Ok(ids) => store.ids = ids,
            Err(e) => log::warn!(
                "Could not load previous download state from {}: {}",
                store.path.display(),
                e
            ),
        }
        store
    }

    fn read_ids(&self) -> Result<BTreeSet<String>> {
        if !self.path.exists() {
            return Ok(BTreeSet::new());
        }
        let data = fs::read_to_string(&self.path)?;
        let state: StateFile = serde_json::from_str(&data)?;
        Ok(state.video_ids.into_iter().filter_map(id_from_value).collect())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Returns false if the id was already present
    pub fn add(&mut self, id: &str) -> bool {
        self.ids.insert(id.to_string())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Sorted snapshot of the ids
    pub fn ids(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }

    /// Write the full set to disk.
    ///
    /// Goes through a sibling temp file and a rename so the state file is
    /// either the old or the new document, never a truncated one.
    pub fn persist(&self) -> Result<()> {
        let state = StateFile {
            video_ids: self.ids.iter().cloned().map(Value::String).collect(),
        };
        let json = serde_json::to_string_pretty(&state)?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| {
            WatchError::StatePersistFailed(format!("{}: {}", tmp.display(), e))
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            WatchError::StatePersistFailed(format!("{}: {}", self.path.display(), e))
        })
    }

    /// Add and persist; a persist failure is logged and the in-memory add stands
    pub fn record(&mut self, id: &str) {
        self.add(id);
        if let Err(e) = self.persist() {
            log::warn!("{} (keeping in-memory state)", e);
        }
    }
}
