//! Working-copy status summary
//! Usage: moor status [--repo PATH]

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use crate::git::GitVcs;

use super::resolve_repo;

pub fn execute(repo: Option<PathBuf>) -> Result<()> {
    let repo = resolve_repo(repo)?;
    let status = GitVcs::new().status(repo.root())?;

    println!("{}", crate::LOGO.dimmed());
    println!("Status of {}:", repo.root().display().to_string().cyan());
    println!("{}", "─".repeat(60).dimmed());

    if status.is_clean() {
        println!("{} Working copy clean", "✓".green().bold());
        return Ok(());
    }

    print_group("staged", &status.staged, |s| s.green());
    print_group("modified", &status.modified, |s| s.yellow());
    print_group("untracked", &status.untracked, |s| s.dimmed());
    print_group("conflicted", &status.conflicted, |s| s.red().bold());

    Ok(())
}

fn print_group(
    label: &str,
    files: &[String],
    paint: impl Fn(&str) -> colored::ColoredString,
) {
    if files.is_empty() {
        return;
    }
    println!("{} ({}):", paint(label), files.len());
    for file in files {
        println!("  {}", paint(file));
    }
}
