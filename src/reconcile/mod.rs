//! Worktree reconciliation
//!
//! Makes persisted worktree records match the authoritative `git worktree
//! list` output for a repository. Runs in two passes: a delete pass that
//! drops records whose paths are gone from disk (or that duplicate an
//! already-seen path), then an upsert pass that updates surviving records in
//! place and creates records for newly discovered worktrees. The delete pass
//! always completes first so a stale duplicate can never shadow a legitimate
//! update.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

use crate::git::{DiscoveredWorktree, GitVcs, VcsError};
use crate::models::{Repository, WorktreeRecord};
use crate::paths;
use crate::store::{StoreError, WorktreeStore};

#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The repository root no longer exists on disk. Distinct from generic
    /// VCS failures so callers can offer relocation rather than deletion.
    #[error("repository path does not exist: {path}")]
    PathMissing { path: PathBuf },

    #[error(transparent)]
    Vcs(VcsError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<VcsError> for ReconcileError {
    fn from(err: VcsError) -> Self {
        match err {
            VcsError::PathMissing { path } => ReconcileError::PathMissing { path },
            other => ReconcileError::Vcs(other),
        }
    }
}

/// Counts of persisted mutations performed by one reconciliation pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl ReconcileSummary {
    /// True when the pass performed no persisted mutations.
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.updated == 0 && self.deleted == 0
    }
}

/// Source of the authoritative worktree listing.
///
/// Production uses [`GitVcs`]; tests substitute a fixture listing.
pub trait WorktreeSource {
    fn list_worktrees(&self, repo_root: &std::path::Path)
        -> Result<Vec<DiscoveredWorktree>, VcsError>;
}

impl WorktreeSource for GitVcs {
    fn list_worktrees(
        &self,
        repo_root: &std::path::Path,
    ) -> Result<Vec<DiscoveredWorktree>, VcsError> {
        GitVcs::list_worktrees(self, repo_root)
    }
}

/// Reconciles persisted records against the authoritative listing.
pub struct WorktreeReconciler<'a, S: WorktreeSource, P: WorktreeStore> {
    source: &'a S,
    store: &'a mut P,
}

impl<'a, S: WorktreeSource, P: WorktreeStore> WorktreeReconciler<'a, S, P> {
    pub fn new(source: &'a S, store: &'a mut P) -> Self {
        Self { source, store }
    }

    /// Run one reconciliation for `repo`.
    ///
    /// Idempotent: a second run with unchanged on-disk state performs zero
    /// persistence writes.
    pub fn reconcile(&mut self, repo: &Repository) -> Result<ReconcileSummary, ReconcileError> {
        let discovered = self.source.list_worktrees(repo.root())?;

        // Normalize everything up front; both sides of the comparison must
        // share one path shape.
        let authoritative: Vec<DiscoveredWorktree> = discovered
            .into_iter()
            .map(|mut wt| {
                wt.path = paths::normalize(&wt.path, repo.root());
                wt
            })
            .collect();
        let authoritative_paths: HashSet<PathBuf> =
            authoritative.iter().map(|wt| wt.path.clone()).collect();

        let persisted = self.store.worktrees_for_repo(&repo.id)?;

        // Delete pass: drop records that vanished from disk or that share a
        // path with a record already kept this pass.
        let mut summary = ReconcileSummary::default();
        let mut kept: HashMap<PathBuf, WorktreeRecord> = HashMap::new();
        let mut doomed: Vec<String> = Vec::new();

        for mut record in persisted {
            record.path = paths::normalize(&record.path, repo.root());
            let stale = !authoritative_paths.contains(&record.path);
            let duplicate = kept.contains_key(&record.path);
            if stale || duplicate {
                debug!(
                    path = %record.path.display(),
                    stale, duplicate,
                    "deleting persisted worktree record"
                );
                doomed.push(record.id.clone());
            } else {
                kept.insert(record.path.clone(), record);
            }
        }

        if !doomed.is_empty() {
            summary.deleted = doomed.len();
            self.store.remove_many(&doomed)?;
        }

        // Upsert pass: update kept records in place, create the rest.
        for wt in &authoritative {
            match kept.get_mut(&wt.path) {
                Some(record) => {
                    if record.apply(wt.branch.as_deref(), wt.is_primary) {
                        debug!(path = %wt.path.display(), "updating worktree record");
                        summary.updated += 1;
                        self.store.update(record)?;
                    }
                }
                None => {
                    debug!(path = %wt.path.display(), "creating worktree record");
                    let record = WorktreeRecord::new(
                        repo.id.clone(),
                        wt.path.clone(),
                        wt.branch.clone(),
                        wt.is_primary,
                    );
                    summary.created += 1;
                    self.store.insert(record)?;
                }
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::path::Path;

    struct FixtureSource {
        worktrees: Vec<DiscoveredWorktree>,
    }

    impl WorktreeSource for FixtureSource {
        fn list_worktrees(&self, _root: &Path) -> Result<Vec<DiscoveredWorktree>, VcsError> {
            Ok(self.worktrees.clone())
        }
    }

    struct MissingSource;

    impl WorktreeSource for MissingSource {
        fn list_worktrees(&self, root: &Path) -> Result<Vec<DiscoveredWorktree>, VcsError> {
            Err(VcsError::PathMissing {
                path: root.to_path_buf(),
            })
        }
    }

    fn discovered(path: &str, branch: Option<&str>, primary: bool) -> DiscoveredWorktree {
        DiscoveredWorktree {
            path: PathBuf::from(path),
            branch: branch.map(|b| b.to_string()),
            is_primary: primary,
        }
    }

    fn repo() -> Repository {
        Repository::with_id("repo-1".to_string(), PathBuf::from("/repo"))
    }

    #[test]
    fn test_creates_records_for_discovered_worktrees() {
        let source = FixtureSource {
            worktrees: vec![
                discovered("/repo", Some("main"), true),
                discovered("/repo/.worktrees/a", Some("feature-a"), false),
            ],
        };
        let mut store = MemoryStore::new();

        let summary = WorktreeReconciler::new(&source, &mut store)
            .reconcile(&repo())
            .expect("Should reconcile");

        assert_eq!(summary.created, 2);
        assert_eq!(summary.updated, 0);
        assert_eq!(summary.deleted, 0);
        assert_eq!(store.records().len(), 2);
    }

    #[test]
    fn test_deletes_stale_records() {
        let source = FixtureSource {
            worktrees: vec![discovered("/repo", Some("main"), true)],
        };
        let mut store = MemoryStore::with_records(vec![
            WorktreeRecord::new(
                "repo-1".to_string(),
                PathBuf::from("/repo"),
                Some("main".to_string()),
                true,
            ),
            WorktreeRecord::new(
                "repo-1".to_string(),
                PathBuf::from("/repo/.worktrees/gone"),
                Some("gone".to_string()),
                false,
            ),
        ]);

        let summary = WorktreeReconciler::new(&source, &mut store)
            .reconcile(&repo())
            .expect("Should reconcile");

        assert_eq!(summary.deleted, 1);
        assert_eq!(summary.created, 0);
        assert_eq!(store.records().len(), 1);
        assert_eq!(store.records()[0].path, PathBuf::from("/repo"));
    }

    #[test]
    fn test_deletes_duplicate_records() {
        let source = FixtureSource {
            worktrees: vec![discovered("/repo", Some("main"), true)],
        };
        let first = WorktreeRecord::new(
            "repo-1".to_string(),
            PathBuf::from("/repo"),
            Some("main".to_string()),
            true,
        );
        let duplicate = WorktreeRecord::new(
            "repo-1".to_string(),
            PathBuf::from("/repo"),
            Some("stale-branch".to_string()),
            false,
        );
        let kept_id = first.id.clone();
        let mut store = MemoryStore::with_records(vec![first, duplicate]);

        let summary = WorktreeReconciler::new(&source, &mut store)
            .reconcile(&repo())
            .expect("Should reconcile");

        assert_eq!(summary.deleted, 1);
        assert_eq!(store.records().len(), 1);
        // The first record wins; the duplicate must not shadow its update.
        assert_eq!(store.records()[0].id, kept_id);
    }

    #[test]
    fn test_updates_record_matched_by_normalized_path() {
        let source = FixtureSource {
            worktrees: vec![discovered("/a/b/../b", Some("renamed"), true)],
        };
        let existing = WorktreeRecord::new(
            "repo-1".to_string(),
            PathBuf::from("/a/b"),
            Some("main".to_string()),
            true,
        );
        let existing_id = existing.id.clone();
        let mut store = MemoryStore::with_records(vec![existing]);

        let summary = WorktreeReconciler::new(&source, &mut store)
            .reconcile(&repo())
            .expect("Should reconcile");

        // Updated in place, not deleted and recreated.
        assert_eq!(summary.deleted, 0);
        assert_eq!(summary.created, 0);
        assert_eq!(summary.updated, 1);
        assert_eq!(store.records()[0].id, existing_id);
        assert_eq!(store.records()[0].branch.as_deref(), Some("renamed"));
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let source = FixtureSource {
            worktrees: vec![
                discovered("/repo", Some("main"), true),
                discovered("/repo/.worktrees/a", Some("feature-a"), false),
            ],
        };
        let mut store = MemoryStore::new();

        WorktreeReconciler::new(&source, &mut store)
            .reconcile(&repo())
            .expect("Should reconcile");
        let writes_after_first = store.write_count();

        let summary = WorktreeReconciler::new(&source, &mut store)
            .reconcile(&repo())
            .expect("Should reconcile again");

        assert!(summary.is_noop());
        assert_eq!(store.write_count(), writes_after_first);
    }

    #[test]
    fn test_missing_repo_root_is_typed() {
        let mut store = MemoryStore::new();
        let err = WorktreeReconciler::new(&MissingSource, &mut store)
            .reconcile(&repo())
            .unwrap_err();

        assert!(matches!(err, ReconcileError::PathMissing { .. }));
    }
}
