//! Persistence for worktree records
//!
//! Records live in a single JSON file under the moor state directory. Reads
//! and writes go through `fs2` advisory locks so a reconciliation running in
//! one process cannot corrupt the file under a concurrent CLI invocation.
//! Advisory locks are cooperative - all participants must use this store.

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::WorktreeRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access store file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store file {path} is corrupt")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// CRUD over persisted worktree records.
///
/// Reconciliation is written against this trait; production uses
/// [`JsonFileStore`], tests use [`MemoryStore`] to count writes.
pub trait WorktreeStore {
    /// All records belonging to a repository.
    fn worktrees_for_repo(&self, repo_id: &str) -> Result<Vec<WorktreeRecord>, StoreError>;

    fn insert(&mut self, record: WorktreeRecord) -> Result<(), StoreError>;

    fn update(&mut self, record: &WorktreeRecord) -> Result<(), StoreError>;

    fn remove_many(&mut self, ids: &[String]) -> Result<(), StoreError>;

    /// Find a record by its normalized path.
    fn find_by_path(&self, repo_id: &str, path: &Path) -> Result<Option<WorktreeRecord>, StoreError> {
        Ok(self
            .worktrees_for_repo(repo_id)?
            .into_iter()
            .find(|rec| rec.path == path))
    }
}

/// On-disk layout of the store file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    worktrees: Vec<WorktreeRecord>,
}

/// JSON-file-backed store with advisory locking.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Resolve the store location: `MOOR_STATE_DIR` override, else the
    /// platform data directory.
    pub fn default_path() -> PathBuf {
        if let Ok(dir) = std::env::var("MOOR_STATE_DIR") {
            return PathBuf::from(dir).join("worktrees.json");
        }
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("moor")
            .join("worktrees.json")
    }

    /// Read the whole store file under a shared lock.
    ///
    /// A missing file is an empty store, not an error.
    fn load(&self) -> Result<StoreFile, StoreError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(StoreFile::default());
            }
            Err(e) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };
        file.lock_shared().map_err(|e| StoreError::Io {
            path: self.path.clone(),
            source: e,
        })?;

        let mut content = String::new();
        BufReader::new(&file)
            .read_to_string(&mut content)
            .map_err(|e| StoreError::Io {
                path: self.path.clone(),
                source: e,
            })?;

        serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Write the whole store file under an exclusive lock.
    ///
    /// The file is truncated via set_len(0) AFTER acquiring the lock to
    /// prevent the TOCTOU race where another process reads an empty file
    /// between truncation and write completion.
    fn save(&self, store: &StoreFile) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let io_err = |e: std::io::Error| StoreError::Io {
            path: self.path.clone(),
            source: e,
        };

        #[allow(clippy::suspicious_open_options)]
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .open(&self.path)
            .map_err(io_err)?;
        file.lock_exclusive().map_err(io_err)?;
        file.set_len(0).map_err(io_err)?;

        let content = serde_json::to_string_pretty(store).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            source: e,
        })?;

        let mut writer = BufWriter::new(&file);
        writer.write_all(content.as_bytes()).map_err(io_err)?;
        writer.flush().map_err(io_err)?;
        Ok(())
    }
}

impl WorktreeStore for JsonFileStore {
    fn worktrees_for_repo(&self, repo_id: &str) -> Result<Vec<WorktreeRecord>, StoreError> {
        Ok(self
            .load()?
            .worktrees
            .into_iter()
            .filter(|rec| rec.repo_id == repo_id)
            .collect())
    }

    fn insert(&mut self, record: WorktreeRecord) -> Result<(), StoreError> {
        let mut store = self.load()?;
        store.worktrees.push(record);
        self.save(&store)
    }

    fn update(&mut self, record: &WorktreeRecord) -> Result<(), StoreError> {
        let mut store = self.load()?;
        if let Some(existing) = store.worktrees.iter_mut().find(|r| r.id == record.id) {
            *existing = record.clone();
        }
        self.save(&store)
    }

    fn remove_many(&mut self, ids: &[String]) -> Result<(), StoreError> {
        let mut store = self.load()?;
        store.worktrees.retain(|r| !ids.contains(&r.id));
        self.save(&store)
    }
}

/// In-memory store that counts writes, for reconciliation tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<WorktreeRecord>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<WorktreeRecord>) -> Self {
        Self { records, writes: 0 }
    }

    /// Number of mutating operations performed.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    pub fn records(&self) -> &[WorktreeRecord] {
        &self.records
    }
}

impl WorktreeStore for MemoryStore {
    fn worktrees_for_repo(&self, repo_id: &str) -> Result<Vec<WorktreeRecord>, StoreError> {
        Ok(self
            .records
            .iter()
            .filter(|rec| rec.repo_id == repo_id)
            .cloned()
            .collect())
    }

    fn insert(&mut self, record: WorktreeRecord) -> Result<(), StoreError> {
        self.writes += 1;
        self.records.push(record);
        Ok(())
    }

    fn update(&mut self, record: &WorktreeRecord) -> Result<(), StoreError> {
        self.writes += 1;
        if let Some(existing) = self.records.iter_mut().find(|r| r.id == record.id) {
            *existing = record.clone();
        }
        Ok(())
    }

    fn remove_many(&mut self, ids: &[String]) -> Result<(), StoreError> {
        self.writes += 1;
        self.records.retain(|r| !ids.contains(&r.id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn record(repo_id: &str, path: &str) -> WorktreeRecord {
        WorktreeRecord::new(repo_id.to_string(), PathBuf::from(path), None, false)
    }

    #[test]
    fn test_json_store_roundtrip() {
        let temp = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(temp.path().join("worktrees.json"));

        store.insert(record("repo-1", "/repo")).unwrap();
        store.insert(record("repo-1", "/repo/.worktrees/a")).unwrap();
        store.insert(record("repo-2", "/other")).unwrap();

        let records = store.worktrees_for_repo("repo-1").unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_json_store_missing_file_is_empty() {
        let temp = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(temp.path().join("missing.json"));
        assert!(store.worktrees_for_repo("repo-1").unwrap().is_empty());
    }

    #[test]
    fn test_json_store_update_and_remove() {
        let temp = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(temp.path().join("worktrees.json"));

        let mut rec = record("repo-1", "/repo/.worktrees/a");
        store.insert(rec.clone()).unwrap();

        rec.apply(Some("feature"), false);
        store.update(&rec).unwrap();

        let records = store.worktrees_for_repo("repo-1").unwrap();
        assert_eq!(records[0].branch.as_deref(), Some("feature"));

        store.remove_many(&[rec.id.clone()]).unwrap();
        assert!(store.worktrees_for_repo("repo-1").unwrap().is_empty());
    }

    #[test]
    fn test_json_store_corrupt_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("worktrees.json");
        std::fs::write(&path, "not json").unwrap();

        let store = JsonFileStore::new(path);
        assert!(matches!(
            store.worktrees_for_repo("repo-1"),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_find_by_path() {
        let mut store = MemoryStore::new();
        store.insert(record("repo-1", "/repo/.worktrees/a")).unwrap();

        let found = store
            .find_by_path("repo-1", Path::new("/repo/.worktrees/a"))
            .unwrap();
        assert!(found.is_some());

        let missing = store
            .find_by_path("repo-1", Path::new("/repo/.worktrees/b"))
            .unwrap();
        assert!(missing.is_none());
    }
}
