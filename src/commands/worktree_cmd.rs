//! Worktree listing
//! Usage: moor worktree list [--repo PATH]

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use crate::git::GitVcs;
use crate::store::{JsonFileStore, WorktreeStore};

use super::resolve_repo;

/// List the authoritative worktrees and whether each has a persisted record.
pub fn list(repo: Option<PathBuf>) -> Result<()> {
    let repo = resolve_repo(repo)?;
    let vcs = GitVcs::new();
    let store = JsonFileStore::new(JsonFileStore::default_path());

    let discovered = vcs.list_worktrees(repo.root())?;
    let persisted = store.worktrees_for_repo(&repo.id)?;

    println!("Worktrees of {}:", repo.root().display().to_string().cyan());
    println!("{}", "─".repeat(60).dimmed());

    if discovered.is_empty() {
        println!("(no worktrees found)");
        return Ok(());
    }

    for wt in &discovered {
        let branch = wt.branch.as_deref().unwrap_or("(detached)");
        let marker = if wt.is_primary {
            "primary".green()
        } else {
            "linked".normal()
        };
        let tracked = persisted.iter().any(|rec| rec.path == wt.path);
        let tracked_marker = if tracked {
            "✓".green().bold()
        } else {
            "⚠ unsynced".yellow()
        };
        println!(
            "  {} {} -> {} [{}]",
            tracked_marker,
            wt.path.display(),
            branch.cyan(),
            marker,
        );
    }

    let stale = persisted
        .iter()
        .filter(|rec| !discovered.iter().any(|wt| wt.path == rec.path))
        .count();
    if stale > 0 {
        println!();
        println!(
            "{} {} stale record(s); run {} to clean up",
            "⚠".yellow().bold(),
            stale,
            "moor sync".cyan()
        );
    }

    Ok(())
}
