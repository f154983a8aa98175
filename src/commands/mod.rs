pub mod config_cmd;
pub mod diff_cmd;
pub mod env;
pub mod plugin;
pub mod status;
pub mod sync;
pub mod watch_cmd;
pub mod worktree_cmd;

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::models::Repository;
use crate::paths;

/// Resolve the target repository from an optional `--repo` argument.
///
/// The repository id is the normalized root path, which keeps persisted
/// records stable across invocations without a registration step.
pub fn resolve_repo(repo: Option<PathBuf>) -> Result<Repository> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    let root = match repo {
        Some(path) => paths::normalize(&path, &cwd),
        None => paths::normalize(&cwd, &cwd),
    };
    let id = root.display().to_string();
    Ok(Repository::with_id(id, root))
}
