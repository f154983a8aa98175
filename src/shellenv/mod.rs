//! Interactive-shell environment resolution
//!
//! CLI tools inherit whatever environment their parent process had, which on
//! launchd- or IDE-spawned processes is missing everything the user's shell
//! profile sets up (PATH additions, language managers, credentials helpers).
//! This module spawns the user's login shell once, captures its environment,
//! and caches it process-wide. Resolution is single-flight: concurrent
//! callers share one shell spawn and all observe the same result.

use std::collections::HashMap;
use std::process::Command;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use tracing::{debug, warn};

pub type EnvMap = HashMap<String, String>;

/// Spawns a shell and captures its environment.
pub trait ShellSpawner: Send + Sync + 'static {
    fn capture(&self) -> std::io::Result<EnvMap>;
}

/// Runs `$SHELL -ilc env` and parses the output.
#[derive(Debug, Default)]
pub struct LoginShellSpawner;

impl ShellSpawner for LoginShellSpawner {
    fn capture(&self) -> std::io::Result<EnvMap> {
        let shell = std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string());
        let output = Command::new(&shell).args(["-i", "-l", "-c", "env"]).output()?;

        if !output.status.success() {
            return Err(std::io::Error::other(format!(
                "{shell} exited with {}",
                output.status
            )));
        }

        Ok(parse_env_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Parse `env` output into a map.
///
/// Lines without `=` are continuation lines of a multi-line value (functions
/// exported by bash, for instance) and are dropped; the resolver only cares
/// about plain variables.
fn parse_env_output(output: &str) -> EnvMap {
    output
        .lines()
        .filter_map(|line| {
            line.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
        })
        .collect()
}

fn process_env() -> EnvMap {
    std::env::vars().collect()
}

#[derive(Default)]
struct ResolverState {
    resolved: Option<EnvMap>,
    in_flight: bool,
}

/// Process-wide lazy resolver for the interactive-shell environment.
///
/// Constructed once at the composition root and shared by reference.
pub struct ShellEnvironmentResolver {
    spawner: Arc<dyn ShellSpawner>,
    state: Arc<(Mutex<ResolverState>, Condvar)>,
}

impl Default for ShellEnvironmentResolver {
    fn default() -> Self {
        Self::new(Arc::new(LoginShellSpawner))
    }
}

impl ShellEnvironmentResolver {
    pub fn new(spawner: Arc<dyn ShellSpawner>) -> Self {
        Self {
            spawner,
            state: Arc::new((Mutex::new(ResolverState::default()), Condvar::new()),),
        }
    }

    /// Fast path: never blocks.
    ///
    /// Returns the resolved environment when available. With a cold cache it
    /// returns the process's own environment immediately and kicks off
    /// background resolution, so later calls see the accurate result.
    pub fn get(&self) -> EnvMap {
        let (mutex, _) = &*self.state;
        let mut state = mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(resolved) = &state.resolved {
            return resolved.clone();
        }

        if !state.in_flight {
            state.in_flight = true;
            drop(state);
            debug!("shell environment not yet resolved, starting background resolution");

            let spawner = Arc::clone(&self.spawner);
            let shared = Arc::clone(&self.state);
            thread::spawn(move || {
                let result = resolve_with_fallback(spawner.as_ref());
                let (mutex, condvar) = &*shared;
                let mut state = mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                state.resolved = Some(result);
                state.in_flight = false;
                condvar.notify_all();
            });
        }

        process_env()
    }

    /// Slow path: always returns the fully resolved environment, blocking
    /// until resolution completes.
    ///
    /// Single-flight: if a resolution is already running, this waits for it
    /// instead of spawning another shell.
    pub fn get_blocking(&self) -> EnvMap {
        let (mutex, condvar) = &*self.state;
        let mut state = mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        loop {
            if let Some(resolved) = &state.resolved {
                return resolved.clone();
            }

            if state.in_flight {
                state = condvar
                    .wait(state)
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                continue;
            }

            state.in_flight = true;
            drop(state);

            let result = resolve_with_fallback(self.spawner.as_ref());

            state = mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            state.resolved = Some(result.clone());
            state.in_flight = false;
            condvar.notify_all();
            return result;
        }
    }

    /// Drop the cached result; the next call recomputes.
    pub fn invalidate(&self) {
        let (mutex, _) = &*self.state;
        let mut state = mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        state.resolved = None;
    }

    /// True once a resolution has completed and is cached.
    pub fn is_resolved(&self) -> bool {
        let (mutex, _) = &*self.state;
        mutex
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .resolved
            .is_some()
    }
}

/// Run the spawner; a failure falls back to the process's own environment.
/// A best-effort environment beats blocking every dependent feature.
fn resolve_with_fallback(spawner: &dyn ShellSpawner) -> EnvMap {
    match spawner.capture() {
        Ok(env) => env,
        Err(err) => {
            warn!(error = %err, "shell spawn failed, falling back to process environment");
            process_env()
        }
    }
}
