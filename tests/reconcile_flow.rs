//! End-to-end reconciliation against real git repositories
//!
//! These tests drive the reconciler with the production GitVcs source and the
//! JSON file store, exercising the full path from `git worktree list` output
//! to persisted records:
//! - initial sync creates records for primary and linked worktrees
//! - a second sync with unchanged disk state is a no-op
//! - removing a worktree deletes its record
//! - renaming a branch updates the record in place

use moor::git::GitVcs;
use moor::models::Repository;
use moor::reconcile::{ReconcileError, WorktreeReconciler};
use moor::store::{JsonFileStore, WorktreeStore};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Should spawn git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Create a git repository with one commit so worktrees can be added.
fn init_repo(dir: &Path) {
    git(dir, &["init", "-b", "main"]);
    git(dir, &["config", "user.email", "test@example.com"]);
    git(dir, &["config", "user.name", "Test"]);
    std::fs::write(dir.join("README.md"), "hello\n").expect("Should write file");
    git(dir, &["add", "."]);
    git(dir, &["commit", "-m", "initial"]);
}

struct Fixture {
    _temp: TempDir,
    repo_dir: PathBuf,
    store: JsonFileStore,
    repo: Repository,
}

fn fixture() -> Fixture {
    let temp = TempDir::new().expect("Should create tempdir");
    // Canonicalize so our paths match the ones git reports.
    let root = temp.path().canonicalize().expect("Should canonicalize");
    let repo_dir = root.join("repo");
    std::fs::create_dir(&repo_dir).expect("Should create repo dir");
    init_repo(&repo_dir);

    let store = JsonFileStore::new(root.join("state").join("worktrees.json"));
    let repo = Repository::with_id(repo_dir.display().to_string(), repo_dir.clone());
    Fixture {
        _temp: temp,
        repo_dir,
        store,
        repo,
    }
}

#[test]
fn test_initial_sync_creates_records() {
    let mut fx = fixture();
    git(&fx.repo_dir, &["worktree", "add", "../wt-a", "-b", "feature-a"]);

    let vcs = GitVcs::new();
    let summary = WorktreeReconciler::new(&vcs, &mut fx.store)
        .reconcile(&fx.repo)
        .expect("Should reconcile");

    assert_eq!(summary.created, 2);
    assert_eq!(summary.deleted, 0);

    let records = fx
        .store
        .worktrees_for_repo(&fx.repo.id)
        .expect("Should read records");
    assert_eq!(records.len(), 2);

    let primary = records
        .iter()
        .find(|r| r.is_primary)
        .expect("Should have a primary record");
    assert_eq!(primary.branch.as_deref(), Some("main"));

    let linked = records
        .iter()
        .find(|r| !r.is_primary)
        .expect("Should have a linked record");
    assert_eq!(linked.branch.as_deref(), Some("feature-a"));
}

#[test]
fn test_second_sync_is_noop() {
    let mut fx = fixture();
    git(&fx.repo_dir, &["worktree", "add", "../wt-a", "-b", "feature-a"]);

    let vcs = GitVcs::new();
    WorktreeReconciler::new(&vcs, &mut fx.store)
        .reconcile(&fx.repo)
        .expect("Should reconcile");

    let summary = WorktreeReconciler::new(&vcs, &mut fx.store)
        .reconcile(&fx.repo)
        .expect("Should reconcile again");
    assert!(summary.is_noop(), "unchanged disk state must be a no-op");
}

#[test]
fn test_removed_worktree_deletes_record() {
    let mut fx = fixture();
    git(&fx.repo_dir, &["worktree", "add", "../wt-a", "-b", "feature-a"]);

    let vcs = GitVcs::new();
    WorktreeReconciler::new(&vcs, &mut fx.store)
        .reconcile(&fx.repo)
        .expect("Should reconcile");

    git(&fx.repo_dir, &["worktree", "remove", "--force", "../wt-a"]);

    let summary = WorktreeReconciler::new(&vcs, &mut fx.store)
        .reconcile(&fx.repo)
        .expect("Should reconcile after removal");
    assert_eq!(summary.deleted, 1);
    assert_eq!(summary.created, 0);

    let records = fx
        .store
        .worktrees_for_repo(&fx.repo.id)
        .expect("Should read records");
    assert_eq!(records.len(), 1);
    assert!(records[0].is_primary);
}

#[test]
fn test_branch_rename_updates_record_in_place() {
    let mut fx = fixture();
    git(&fx.repo_dir, &["worktree", "add", "../wt-a", "-b", "feature-a"]);

    let vcs = GitVcs::new();
    WorktreeReconciler::new(&vcs, &mut fx.store)
        .reconcile(&fx.repo)
        .expect("Should reconcile");

    let before = fx
        .store
        .worktrees_for_repo(&fx.repo.id)
        .expect("Should read records");
    let linked_id = before
        .iter()
        .find(|r| !r.is_primary)
        .expect("Should have a linked record")
        .id
        .clone();

    git(&fx.repo_dir, &["branch", "-m", "feature-a", "feature-b"]);

    let summary = WorktreeReconciler::new(&vcs, &mut fx.store)
        .reconcile(&fx.repo)
        .expect("Should reconcile after rename");
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.deleted, 0);
    assert_eq!(summary.created, 0);

    let after = fx
        .store
        .worktrees_for_repo(&fx.repo.id)
        .expect("Should read records");
    let linked = after
        .iter()
        .find(|r| !r.is_primary)
        .expect("Should still have the linked record");
    assert_eq!(linked.id, linked_id, "record must be updated, not recreated");
    assert_eq!(linked.branch.as_deref(), Some("feature-b"));
}

#[test]
fn test_missing_repo_root_is_typed_error() {
    let mut fx = fixture();
    let gone = Repository::with_id(
        "/nonexistent".to_string(),
        PathBuf::from("/nonexistent/repo/path"),
    );

    let vcs = GitVcs::new();
    let err = WorktreeReconciler::new(&vcs, &mut fx.store)
        .reconcile(&gone)
        .expect_err("Should fail for a missing root");
    assert!(matches!(err, ReconcileError::PathMissing { .. }));
}
