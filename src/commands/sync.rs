//! Reconcile persisted worktree records with the on-disk truth
//! Usage: moor sync [--repo PATH]

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use crate::git::GitVcs;
use crate::reconcile::{ReconcileSummary, WorktreeReconciler};
use crate::store::JsonFileStore;

use super::resolve_repo;

pub fn execute(repo: Option<PathBuf>) -> Result<()> {
    let repo = resolve_repo(repo)?;
    let vcs = GitVcs::new();
    let mut store = JsonFileStore::new(JsonFileStore::default_path());

    println!(
        "Syncing worktrees for {}",
        repo.root().display().to_string().cyan()
    );

    let summary = WorktreeReconciler::new(&vcs, &mut store).reconcile(&repo)?;
    print_summary(&summary);
    Ok(())
}

pub fn print_summary(summary: &ReconcileSummary) {
    if summary.is_noop() {
        println!("{} Already in sync", "✓".green().bold());
        return;
    }
    println!(
        "{} Synced: {} created, {} updated, {} deleted",
        "✓".green().bold(),
        summary.created.to_string().green(),
        summary.updated.to_string().cyan(),
        summary.deleted.to_string().yellow(),
    );
}
