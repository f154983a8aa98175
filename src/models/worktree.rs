use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// A persisted record of a git worktree.
///
/// One record exists per checked-out working directory of a repository. The
/// path is stored in normalized form (absolute, leading `/`, no trailing
/// slash) and is unique within a repository; reconciliation deletes any
/// duplicate it encounters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorktreeRecord {
    /// Stable identifier
    pub id: String,
    /// Repository this worktree belongs to
    pub repo_id: String,
    /// Absolute, normalized path to the worktree directory
    pub path: PathBuf,
    /// Checked-out branch, if any (detached HEAD has none)
    pub branch: Option<String>,
    /// True for the repository's main checkout
    pub is_primary: bool,
    /// When this worktree was last opened or reconciled
    pub last_accessed: DateTime<Utc>,
}

impl WorktreeRecord {
    /// Create a new record for a freshly discovered worktree.
    pub fn new(repo_id: String, path: PathBuf, branch: Option<String>, is_primary: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            repo_id,
            path,
            branch,
            is_primary,
            last_accessed: Utc::now(),
        }
    }

    /// Update the branch and primary flag from an authoritative listing.
    ///
    /// Returns true if either field actually changed, so callers can skip
    /// persistence writes for no-op updates.
    pub fn apply(&mut self, branch: Option<&str>, is_primary: bool) -> bool {
        let new_branch = branch.map(|b| b.to_string());
        if self.branch == new_branch && self.is_primary == is_primary {
            return false;
        }
        self.branch = new_branch;
        self.is_primary = is_primary;
        self.last_accessed = Utc::now();
        true
    }

}
