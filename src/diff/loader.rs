//! Per-file diff loading with single-flight and cancellation
//!
//! A load request spawns a worker thread per file. A second request for a
//! file that is already loading is a no-op, so selection churn in a caller
//! never piles up duplicate computations. Cancellation is cooperative: the
//! worker checks its token before publishing, so a cancelled load never leaks
//! a stale result into the cache or to observers.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::cache::DiffCache;
use crate::git::VcsError;
use crate::models::DiffResult;

/// Produces unified diff text for a single file.
pub trait DiffProducer: Send + Sync + 'static {
    fn diff(&self, file: &Path) -> Result<String, VcsError>;
}

/// Observer invoked on the worker thread when a load completes successfully.
pub type DiffSink = Arc<dyn Fn(&Path, &DiffResult) + Send + Sync>;

/// Tracks how many worker threads are running so callers can drain.
#[derive(Default)]
struct ActiveWorkers {
    count: Mutex<usize>,
    idle: Condvar,
}

pub struct DiffLoader {
    producer: Arc<dyn DiffProducer>,
    cache: Arc<Mutex<DiffCache>>,
    in_flight: Arc<Mutex<HashMap<PathBuf, Arc<AtomicBool>>>>,
    loaded: Arc<Mutex<HashMap<PathBuf, DiffResult>>>,
    failures: Arc<Mutex<HashMap<PathBuf, String>>>,
    workers: Arc<ActiveWorkers>,
    sink: Option<DiffSink>,
}

impl DiffLoader {
    pub fn new(producer: Arc<dyn DiffProducer>, cache: DiffCache) -> Self {
        Self {
            producer,
            cache: Arc::new(Mutex::new(cache)),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            loaded: Arc::new(Mutex::new(HashMap::new())),
            failures: Arc::new(Mutex::new(HashMap::new())),
            workers: Arc::new(ActiveWorkers::default()),
            sink: None,
        }
    }

    /// Register an observer for successful loads.
    pub fn with_sink(mut self, sink: DiffSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Start loading the diff for `file`.
    ///
    /// Returns true if a computation was started, false if one was already in
    /// flight for this file (in which case the call is a no-op). A cached
    /// result does not short-circuit the load; the fresh computation replaces
    /// it, and its hash tells observers whether anything actually changed.
    pub fn load(&self, file: &Path) -> bool {
        let cancelled = Arc::new(AtomicBool::new(false));
        {
            let mut in_flight = self
                .in_flight
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if in_flight.contains_key(file) {
                debug!(file = %file.display(), "diff load already in flight");
                return false;
            }
            in_flight.insert(file.to_path_buf(), Arc::clone(&cancelled));
        }

        {
            let mut count = self
                .workers
                .count
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *count += 1;
        }

        let producer = Arc::clone(&self.producer);
        let cache = Arc::clone(&self.cache);
        let in_flight = Arc::clone(&self.in_flight);
        let loaded = Arc::clone(&self.loaded);
        let failures = Arc::clone(&self.failures);
        let workers = Arc::clone(&self.workers);
        let sink = self.sink.clone();
        let file = file.to_path_buf();

        thread::spawn(move || {
            let outcome = producer.diff(&file);

            // The token re-check and the publish happen under the in-flight
            // lock, which cancel() and invalidate_all() also take to flip the
            // token. Whichever side wins the lock decides: a cancel that gets
            // there first prevents the publish entirely, never mid-way.
            let published = {
                let mut in_flight = in_flight
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                // Our slot must still hold our token. A cancel followed by a
                // fresh load installs a new token that must survive both this
                // check and the cleanup below.
                let ours = in_flight
                    .get(&file)
                    .is_some_and(|token| Arc::ptr_eq(token, &cancelled));
                let live = ours && !cancelled.load(Ordering::SeqCst);

                let published = match outcome {
                    Ok(text) if live => {
                        let result = DiffResult::from_text(&text);
                        cache
                            .lock()
                            .unwrap_or_else(|poisoned| poisoned.into_inner())
                            .put(file.clone(), result.clone());
                        loaded
                            .lock()
                            .unwrap_or_else(|poisoned| poisoned.into_inner())
                            .insert(file.clone(), result.clone());
                        failures
                            .lock()
                            .unwrap_or_else(|poisoned| poisoned.into_inner())
                            .remove(&file);
                        Some(result)
                    }
                    Err(err) if live => {
                        // A single file failing must not poison the loader;
                        // record it per-key and move on.
                        warn!(file = %file.display(), error = %err, "diff computation failed");
                        failures
                            .lock()
                            .unwrap_or_else(|poisoned| poisoned.into_inner())
                            .insert(file.clone(), err.to_string());
                        None
                    }
                    _ => None,
                };

                if ours {
                    in_flight.remove(&file);
                }
                published
            };

            // Observers run outside the lock so a sink may re-enter the
            // loader.
            if let (Some(result), Some(sink)) = (&published, &sink) {
                sink(&file, result);
            }

            let mut count = workers
                .count
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *count -= 1;
            workers.idle.notify_all();
        });

        true
    }

    /// Cancel the in-flight load for `file`, if any. Other files' loads are
    /// unaffected.
    pub fn cancel(&self, file: &Path) {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(token) = in_flight.remove(file) {
            debug!(file = %file.display(), "cancelling diff load");
            token.store(true, Ordering::SeqCst);
        }
    }

    /// Cancel all in-flight work and drop cached plus published results.
    ///
    /// Called around operations that can change every file's diff at once
    /// (pull, checkout, commit).
    pub fn invalidate_all(&self) {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for token in in_flight.values() {
            token.store(true, Ordering::SeqCst);
        }
        in_flight.clear();
        drop(in_flight);

        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .invalidate_all();
        self.loaded
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    /// Invalidate one file's cached and published result.
    pub fn invalidate(&self, file: &Path) {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .invalidate(file);
        self.loaded
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(file);
    }

    /// The most recently published result for `file`, if any.
    pub fn loaded(&self, file: &Path) -> Option<DiffResult> {
        self.loaded
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(file)
            .cloned()
    }

    /// The cached result for `file`, if any.
    pub fn cached(&self, file: &Path) -> Option<DiffResult> {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(file)
            .cloned()
    }

    /// The recorded failure for `file`, if its last load failed.
    pub fn last_failure(&self, file: &Path) -> Option<String> {
        self.failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(file)
            .cloned()
    }

    /// Block until every worker thread has finished or the timeout elapses.
    ///
    /// Returns true if the loader went idle in time.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut count = self
            .workers
            .count
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        while *count > 0 {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, wait) = self
                .workers
                .idle
                .wait_timeout(count, deadline - now)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            count = guard;
            if wait.timed_out() && *count > 0 {
                return false;
            }
        }
        true
    }
}
