//! Per-file diff computation and caching

pub mod cache;
pub mod loader;

pub use cache::DiffCache;
pub use loader::{DiffLoader, DiffProducer, DiffSink};

use std::path::{Path, PathBuf};

use crate::git::{GitVcs, VcsError};

/// [`DiffProducer`] backed by `git diff` for one repository.
pub struct GitFileDiffer {
    repo_root: PathBuf,
    vcs: GitVcs,
    staged: bool,
}

impl GitFileDiffer {
    pub fn new(repo_root: PathBuf, staged: bool) -> Self {
        Self {
            repo_root,
            vcs: GitVcs::new(),
            staged,
        }
    }
}

impl DiffProducer for GitFileDiffer {
    fn diff(&self, file: &Path) -> Result<String, VcsError> {
        self.vcs.diff(&self.repo_root, file, self.staged)
    }
}
