//! Low-level filesystem watch primitive
//!
//! The coordinator only needs "something changed under this path" signals.
//! The backend trait keeps that contract narrow: start a watcher that fires a
//! callback on any event, stop it by dropping the returned handle.

use notify::{RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatchStartError {
    #[error("failed to start watcher for {path}: {message}")]
    Backend { path: PathBuf, message: String },
}

/// An active watch. Dropping the handle stops the underlying watcher.
pub trait WatchHandle: Send {}

/// Starts OS-level watchers.
pub trait WatchBackend: Send + Sync {
    fn start(
        &self,
        path: &Path,
        on_event: Arc<dyn Fn() + Send + Sync>,
    ) -> Result<Box<dyn WatchHandle>, WatchStartError>;
}

/// Production backend wrapping `notify`'s recommended platform watcher.
///
/// Event detail is deliberately discarded: every successful event collapses
/// to one `on_event()` call, and error events are dropped.
#[derive(Debug, Default)]
pub struct NotifyBackend;

impl NotifyBackend {
    pub fn new() -> Self {
        Self
    }
}

struct NotifyHandle {
    _watcher: notify::RecommendedWatcher,
}

impl WatchHandle for NotifyHandle {}

impl WatchBackend for NotifyBackend {
    fn start(
        &self,
        path: &Path,
        on_event: Arc<dyn Fn() + Send + Sync>,
    ) -> Result<Box<dyn WatchHandle>, WatchStartError> {
        let start_err = |e: notify::Error| WatchStartError::Backend {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let mut watcher =
            notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
                if res.is_ok() {
                    on_event();
                }
            })
            .map_err(start_err)?;

        watcher
            .watch(path, RecursiveMode::Recursive)
            .map_err(start_err)?;

        Ok(Box::new(NotifyHandle { _watcher: watcher }))
    }
}
