//! Git command runner
//!
//! Centralizes git invocation with consistent error handling. The repository
//! root is checked before spawning so a deleted or relocated checkout surfaces
//! as [`VcsError::PathMissing`] instead of a confusing git error, letting
//! callers offer relocation instead of deletion.

use std::path::Path;
use std::process::{Command, Output};

use super::VcsError;

/// Run a git command and return the raw Output.
///
/// Use this when you need access to both stdout and stderr, or custom
/// error handling logic.
pub fn run_git(args: &[&str], repo_root: &Path) -> Result<Output, VcsError> {
    if !repo_root.exists() {
        return Err(VcsError::PathMissing {
            path: repo_root.to_path_buf(),
        });
    }

    Command::new("git")
        .args(args)
        .current_dir(repo_root)
        .output()
        .map_err(|source| VcsError::Spawn {
            command: format!("git {}", args.join(" ")),
            source,
        })
}

/// Run a git command, check for success, and return stdout as a trimmed String.
///
/// On a non-zero exit, fails with the stderr content.
pub fn run_git_checked(args: &[&str], repo_root: &Path) -> Result<String, VcsError> {
    let output = run_git(args, repo_root)?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(VcsError::CommandFailed {
            command: format!("git {}", args.first().unwrap_or(&"")),
            stderr,
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_missing_root_is_path_missing() {
        let err = run_git(&["status"], Path::new("/nonexistent/repo/path")).unwrap_err();
        match err {
            VcsError::PathMissing { path } => {
                assert_eq!(path, PathBuf::from("/nonexistent/repo/path"));
            }
            other => panic!("expected PathMissing, got {other:?}"),
        }
    }
}
