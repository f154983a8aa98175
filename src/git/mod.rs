//! External VCS collaborator
//!
//! Everything moor knows about version control goes through this module: the
//! authoritative worktree listing, working-copy status, and per-file diffs.
//! All of it shells out to the `git` binary; no VCS logic is reimplemented.

pub mod runner;

use std::path::{Path, PathBuf};
use thiserror::Error;

use runner::{run_git, run_git_checked};

/// Errors from git invocations.
///
/// `PathMissing` is surfaced distinctly from generic failures so callers can
/// offer relocation UX when a repository root has vanished from disk.
#[derive(Debug, Error)]
pub enum VcsError {
    #[error("repository path does not exist: {path}")]
    PathMissing { path: PathBuf },

    #[error("failed to execute {command}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },
}

/// One entry from the authoritative `git worktree list` output.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredWorktree {
    pub path: PathBuf,
    pub branch: Option<String>,
    pub is_primary: bool,
}

/// Working-copy status summary parsed from `git status --porcelain`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingCopyStatus {
    pub staged: Vec<String>,
    pub modified: Vec<String>,
    pub untracked: Vec<String>,
    pub conflicted: Vec<String>,
}

impl WorkingCopyStatus {
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty()
            && self.modified.is_empty()
            && self.untracked.is_empty()
            && self.conflicted.is_empty()
    }
}

/// Git-backed VCS queries.
#[derive(Debug, Clone, Default)]
pub struct GitVcs;

impl GitVcs {
    pub fn new() -> Self {
        Self
    }

    /// List all worktrees of the repository at `repo_root`.
    ///
    /// Parses `git worktree list --porcelain`. The first listed worktree is
    /// the main checkout, which git always reports first; it carries the
    /// primary flag. Bare entries have no working directory and are skipped.
    pub fn list_worktrees(&self, repo_root: &Path) -> Result<Vec<DiscoveredWorktree>, VcsError> {
        let stdout = run_git_checked(&["worktree", "list", "--porcelain"], repo_root)?;
        Ok(parse_worktree_list(&stdout))
    }

    /// Summarize the working copy at `repo_path`.
    pub fn status(&self, repo_path: &Path) -> Result<WorkingCopyStatus, VcsError> {
        let stdout = run_git_checked(&["status", "--porcelain"], repo_path)?;
        Ok(parse_status(&stdout))
    }

    /// Produce the unified diff for a single file.
    ///
    /// With `staged` set, diffs the index against HEAD instead of the working
    /// tree against the index.
    pub fn diff(&self, repo_path: &Path, file: &Path, staged: bool) -> Result<String, VcsError> {
        let file_arg = file.to_string_lossy();
        let mut args = vec!["diff"];
        if staged {
            args.push("--cached");
        }
        args.push("--");
        args.push(&file_arg);

        let output = run_git(&args, repo_path)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(VcsError::CommandFailed {
                command: "git diff".to_string(),
                stderr,
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Parse `git worktree list --porcelain` output.
///
/// Entries are blank-line separated blocks:
/// ```text
/// worktree /path/to/checkout
/// HEAD abc123
/// branch refs/heads/main
/// ```
fn parse_worktree_list(output: &str) -> Vec<DiscoveredWorktree> {
    let mut worktrees = Vec::new();
    let mut current: Option<DiscoveredWorktree> = None;
    let mut current_is_bare = false;

    let mut push = |wt: Option<DiscoveredWorktree>, bare: bool, out: &mut Vec<_>| {
        if let Some(wt) = wt {
            if !bare {
                out.push(wt);
            }
        }
    };

    for line in output.lines() {
        if let Some(path) = line.strip_prefix("worktree ") {
            push(current.take(), current_is_bare, &mut worktrees);
            current_is_bare = false;
            current = Some(DiscoveredWorktree {
                path: PathBuf::from(path),
                branch: None,
                is_primary: false,
            });
        } else if let Some(branch_ref) = line.strip_prefix("branch ") {
            if let Some(ref mut wt) = current {
                let name = branch_ref.strip_prefix("refs/heads/").unwrap_or(branch_ref);
                wt.branch = Some(name.to_string());
            }
        } else if line == "bare" {
            current_is_bare = true;
        } else if line == "detached" {
            if let Some(ref mut wt) = current {
                wt.branch = None;
            }
        }
    }
    push(current.take(), current_is_bare, &mut worktrees);

    if let Some(first) = worktrees.first_mut() {
        first.is_primary = true;
    }
    worktrees
}

/// Parse `git status --porcelain` into a status summary.
///
/// Each line is `XY <path>` where X is the index state and Y the working-tree
/// state. Conflicts are any line with `U` on either side, plus `AA` and `DD`.
fn parse_status(output: &str) -> WorkingCopyStatus {
    let mut status = WorkingCopyStatus::default();

    for line in output.lines() {
        if line.len() < 4 {
            continue;
        }
        let mut chars = line.chars();
        let x = chars.next().unwrap_or(' ');
        let y = chars.next().unwrap_or(' ');
        let path = line[3..].to_string();

        if x == '?' && y == '?' {
            status.untracked.push(path);
        } else if x == 'U' || y == 'U' || (x == 'A' && y == 'A') || (x == 'D' && y == 'D') {
            status.conflicted.push(path);
        } else {
            if x != ' ' {
                status.staged.push(path.clone());
            }
            if y != ' ' {
                status.modified.push(path);
            }
        }
    }

    status
}
