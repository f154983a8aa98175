//! Continuous sync on filesystem change
//! Usage: moor watch [--repo PATH]
//!
//! Subscribes to the repository root and re-runs reconciliation whenever
//! something changes, until interrupted. The watched path is paused while a
//! sync runs, so bursts of events (and our own writes) coalesce into a single
//! follow-up sync instead of a storm.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::git::GitVcs;
use crate::reconcile::WorktreeReconciler;
use crate::store::JsonFileStore;
use crate::watch::{NotifyBackend, WatchCoordinator};

use super::{resolve_repo, sync};

/// Debounce window after an event before re-syncing.
const SETTLE_MS: u64 = 300;

pub fn execute(repo: Option<PathBuf>) -> Result<()> {
    let repo = resolve_repo(repo)?;
    let vcs = GitVcs::new();
    let mut store = JsonFileStore::new(JsonFileStore::default_path());

    let coordinator = WatchCoordinator::new(Arc::new(NotifyBackend::new()));
    let (event_tx, event_rx) = mpsc::channel();
    let subscription = coordinator.subscribe(repo.root(), move || {
        event_tx.send(()).ok();
    });

    if !coordinator.watcher_active(repo.root()) {
        println!(
            "{} Could not start a filesystem watcher for {}; falling back to manual syncs only",
            "⚠".yellow().bold(),
            repo.root().display()
        );
    }

    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_handler = Arc::clone(&interrupted);
    ctrlc::set_handler(move || {
        interrupted_handler.store(true, Ordering::SeqCst);
    })
    .context("Failed to install interrupt handler")?;

    println!(
        "Watching {} (press Ctrl-C to stop)",
        repo.root().display().to_string().cyan()
    );

    // Initial sync so the watcher starts from a consistent baseline.
    let summary = WorktreeReconciler::new(&vcs, &mut store).reconcile(&repo)?;
    sync::print_summary(&summary);

    while !interrupted.load(Ordering::SeqCst) {
        match event_rx.recv_timeout(Duration::from_millis(200)) {
            Ok(()) => {
                // Let the burst settle, then swallow whatever queued up.
                std::thread::sleep(Duration::from_millis(SETTLE_MS));
                while event_rx.try_recv().is_ok() {}

                debug!("change detected, reconciling");
                coordinator.pause(repo.root());
                let result = WorktreeReconciler::new(&vcs, &mut store).reconcile(&repo);
                coordinator.resume(repo.root());

                match result {
                    Ok(summary) if summary.is_noop() => {}
                    Ok(summary) => sync::print_summary(&summary),
                    Err(e) => println!("{} Sync failed: {e}", "✗".red().bold()),
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    coordinator.unsubscribe(repo.root(), subscription);
    println!();
    println!("{} Stopped watching", "✓".green().bold());
    Ok(())
}
