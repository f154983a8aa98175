//! Watch coordination
//!
//! Multiplexes one OS-level watcher per path across any number of logical
//! subscribers, with pause/resume semantics. Pausing a path buffers raw
//! change events into a single pending flag; resuming with pending work
//! dispatches exactly one coalesced notification per subscriber. Pausing must
//! never drop a notification, and resuming must never fire more than one
//! catch-up notification per pause window.

pub mod backend;

pub use backend::{NotifyBackend, WatchBackend, WatchHandle, WatchStartError};

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Identifies one subscriber on one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Arc<dyn Fn() + Send + Sync>;

/// Per-path watch state.
///
/// An entry exists iff its subscriber map is non-empty; it is destroyed (and
/// the underlying watcher stopped via handle drop) exactly when the last
/// subscriber is removed. `handle` is None when the backend failed to start,
/// in which case the path is watched by nobody but subscribers stay
/// registered.
struct WatchEntry {
    handle: Option<Box<dyn WatchHandle>>,
    subscribers: HashMap<u64, Callback>,
    pause_count: u32,
    pending: bool,
}

type Entries = Mutex<HashMap<PathBuf, WatchEntry>>;

/// Fans raw filesystem events out to logical subscribers.
///
/// Constructed once at the composition root and shared by reference; all
/// state transitions serialize on one internal lock, so subscribe,
/// unsubscribe, pause, and resume on the same path never interleave.
pub struct WatchCoordinator {
    backend: Arc<dyn WatchBackend>,
    entries: Arc<Entries>,
    next_id: AtomicU64,
}

impl WatchCoordinator {
    pub fn new(backend: Arc<dyn WatchBackend>) -> Self {
        Self {
            backend,
            entries: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register `callback` for changes under `path`.
    ///
    /// Starts the underlying watcher only if this is the first subscriber for
    /// the path, so N subscribers share one OS watcher. If the backend fails
    /// to start, the subscriber is still registered (degrading to no
    /// notifications) rather than failing the call; transient filesystem
    /// trouble must not break callers.
    pub fn subscribe<F>(&self, path: &Path, callback: F) -> SubscriptionId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut entries = lock(&self.entries);

        let entry = entries.entry(path.to_path_buf()).or_insert_with(|| {
            let handle = match self.start_backend(path) {
                Ok(handle) => Some(handle),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "watcher failed to start; subscriber registered without notifications");
                    None
                }
            };
            WatchEntry {
                handle,
                subscribers: HashMap::new(),
                pause_count: 0,
                pending: false,
            }
        });
        entry.subscribers.insert(id, Arc::new(callback));

        SubscriptionId(id)
    }

    /// Remove one subscriber. When the last subscriber of a path goes away,
    /// the entry is destroyed and the underlying watcher stops.
    pub fn unsubscribe(&self, path: &Path, id: SubscriptionId) {
        // The removed entry (and with it the backend handle) is dropped after
        // the lock is released: a backend whose shutdown synchronizes with an
        // in-flight event callback would otherwise deadlock against
        // dispatch_raw.
        let _removed = {
            let mut entries = lock(&self.entries);
            let now_empty = match entries.get_mut(path) {
                Some(entry) => {
                    entry.subscribers.remove(&id.0);
                    entry.subscribers.is_empty()
                }
                None => false,
            };
            if now_empty {
                debug!(path = %path.display(), "last subscriber removed, stopping watcher");
                entries.remove(path)
            } else {
                None
            }
        };
    }

    /// Suspend dispatch for `path`. Nestable; raw events arriving while
    /// paused are coalesced into a single pending notification.
    pub fn pause(&self, path: &Path) {
        let mut entries = lock(&self.entries);
        if let Some(entry) = entries.get_mut(path) {
            entry.pause_count += 1;
        }
    }

    /// Undo one `pause`. When the pause count reaches zero and a raw event
    /// arrived during the paused window, subscribers are notified exactly
    /// once.
    pub fn resume(&self, path: &Path) {
        let callbacks = {
            let mut entries = lock(&self.entries);
            let Some(entry) = entries.get_mut(path) else {
                return;
            };
            entry.pause_count = entry.pause_count.saturating_sub(1);
            if entry.pause_count == 0 && entry.pending {
                entry.pending = false;
                collect_callbacks(entry)
            } else {
                Vec::new()
            }
        };

        for callback in callbacks {
            callback();
        }
    }

    /// True if the path has a live OS watcher (false when the backend failed
    /// to start and the subscription degraded).
    pub fn watcher_active(&self, path: &Path) -> bool {
        lock(&self.entries)
            .get(path)
            .map(|entry| entry.handle.is_some())
            .unwrap_or(false)
    }

    /// Number of subscribers currently registered for `path`.
    pub fn subscriber_count(&self, path: &Path) -> usize {
        lock(&self.entries)
            .get(path)
            .map(|entry| entry.subscribers.len())
            .unwrap_or(0)
    }

    fn start_backend(&self, path: &Path) -> Result<Box<dyn WatchHandle>, WatchStartError> {
        // The event closure holds only a weak reference so a dangling
        // watcher thread cannot keep the entry map alive.
        let entries = Arc::downgrade(&self.entries);
        let event_path = path.to_path_buf();
        self.backend.start(
            path,
            Arc::new(move || {
                if let Some(entries) = entries.upgrade() {
                    dispatch_raw(&entries, &event_path);
                }
            }),
        )
    }
}

/// Handle one raw change event for `path`.
///
/// Paused entries record the event as pending; unpaused entries dispatch to
/// every subscriber. Callbacks are cloned out and invoked after the lock is
/// released so a callback may re-enter the coordinator.
fn dispatch_raw(entries: &Entries, path: &Path) {
    let callbacks = {
        let mut entries = lock(entries);
        let Some(entry) = entries.get_mut(path) else {
            return;
        };
        if entry.pause_count > 0 {
            entry.pending = true;
            Vec::new()
        } else {
            collect_callbacks(entry)
        }
    };

    for callback in callbacks {
        callback();
    }
}

fn collect_callbacks(entry: &WatchEntry) -> Vec<Callback> {
    entry.subscribers.values().cloned().collect()
}

fn lock(entries: &Entries) -> std::sync::MutexGuard<'_, HashMap<PathBuf, WatchEntry>> {
    entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
