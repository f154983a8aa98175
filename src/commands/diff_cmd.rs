//! Per-file diff display
//! Usage: moor diff <FILE> [--repo PATH] [--staged]

use anyhow::{bail, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::diff::{DiffCache, DiffLoader, GitFileDiffer};

use super::resolve_repo;

/// How long to wait for a single diff computation before giving up.
const LOAD_TIMEOUT: Duration = Duration::from_secs(30);

pub fn execute(file: PathBuf, repo: Option<PathBuf>, staged: bool) -> Result<()> {
    let repo = resolve_repo(repo)?;
    let producer = Arc::new(GitFileDiffer::new(repo.root().to_path_buf(), staged));
    let loader = DiffLoader::new(producer, DiffCache::default());

    loader.load(&file);
    if !loader.wait_idle(LOAD_TIMEOUT) {
        loader.cancel(&file);
        bail!("Timed out computing diff for {}", file.display());
    }

    if let Some(failure) = loader.last_failure(&file) {
        bail!("Diff failed for {}: {failure}", file.display());
    }

    match loader.loaded(&file) {
        Some(result) if result.is_empty() => {
            println!("{} No changes in {}", "✓".green().bold(), file.display());
        }
        Some(result) => {
            for line in &result.lines {
                print_diff_line(line);
            }
        }
        None => bail!("No diff produced for {}", file.display()),
    }

    Ok(())
}

fn print_diff_line(line: &str) {
    if line.starts_with('+') && !line.starts_with("+++") {
        println!("{}", line.green());
    } else if line.starts_with('-') && !line.starts_with("---") {
        println!("{}", line.red());
    } else if line.starts_with("@@") {
        println!("{}", line.cyan());
    } else {
        println!("{line}");
    }
}
