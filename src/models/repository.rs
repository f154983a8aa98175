use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A repository whose worktrees are tracked by moor.
///
/// The root path is the main checkout; worktrees discovered under it (or
/// anywhere else git reports them) are persisted as [`WorktreeRecord`]s keyed
/// by this repository's id.
///
/// [`WorktreeRecord`]: crate::models::WorktreeRecord
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    /// Stable identifier
    pub id: String,
    /// Absolute path to the main checkout
    pub root: PathBuf,
}

impl Repository {
    /// Create a repository handle with a fresh id.
    pub fn new(root: PathBuf) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            root,
        }
    }

    /// Create a repository handle with a caller-chosen id.
    ///
    /// Used when rehydrating from persistence, where the id must stay stable
    /// across runs.
    pub fn with_id(id: String, root: PathBuf) -> Self {
        Self { id, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
