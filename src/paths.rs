//! Lexical path normalization
//!
//! Worktree paths are compared as strings during reconciliation, so every path
//! coming from git or from persisted records is normalized to the same shape:
//! absolute, leading `/`, no trailing slash, with `.` and `..` components
//! resolved lexically. Normalization must not touch the filesystem because the
//! path may no longer exist (that is exactly the case reconciliation detects).

use std::path::{Component, Path, PathBuf};

/// Normalize a path to an absolute, slash-prefixed, non-trailing-slash form.
///
/// `.` components are dropped and `..` components pop the previous component
/// when one exists. Relative paths are resolved against `base`.
pub fn normalize(path: &Path, base: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut parts: Vec<std::ffi::OsString> = Vec::new();
    for component in joined.components() {
        match component {
            Component::RootDir | Component::Prefix(_) => {}
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop();
            }
            Component::Normal(name) => parts.push(name.to_os_string()),
        }
    }

    let mut normalized = PathBuf::from("/");
    for part in parts {
        normalized.push(part);
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_resolves_parent_components() {
        let base = Path::new("/");
        assert_eq!(
            normalize(Path::new("/a/b/../b"), base),
            PathBuf::from("/a/b")
        );
        assert_eq!(
            normalize(Path::new("/a/./b/c/.."), base),
            PathBuf::from("/a/b")
        );
    }

    #[test]
    fn test_normalize_strips_trailing_slash() {
        let base = Path::new("/");
        assert_eq!(normalize(Path::new("/a/b/"), base), PathBuf::from("/a/b"));
    }

    #[test]
    fn test_normalize_relative_against_base() {
        let base = Path::new("/repo");
        assert_eq!(
            normalize(Path::new("../other/wt"), base),
            PathBuf::from("/other/wt")
        );
        assert_eq!(
            normalize(Path::new("sub/wt"), base),
            PathBuf::from("/repo/sub/wt")
        );
    }

    #[test]
    fn test_normalize_parent_past_root_stays_at_root() {
        let base = Path::new("/");
        assert_eq!(normalize(Path::new("/../../a"), base), PathBuf::from("/a"));
    }

    #[test]
    fn test_normalize_root() {
        let base = Path::new("/");
        assert_eq!(normalize(Path::new("/"), base), PathBuf::from("/"));
    }
}
