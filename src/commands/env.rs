//! Resolved shell environment display
//! Usage: moor env show [--refresh] [--blocking]

use anyhow::Result;
use colored::Colorize;

use crate::shellenv::ShellEnvironmentResolver;

pub fn show(refresh: bool, blocking: bool) -> Result<()> {
    let resolver = ShellEnvironmentResolver::default();

    if refresh {
        resolver.invalidate();
    }

    let env = if blocking {
        resolver.get_blocking()
    } else {
        resolver.get()
    };

    if !blocking && !resolver.is_resolved() {
        println!(
            "{} Showing the process environment; resolution is still running (use {} for the resolved one)",
            "⚠".yellow().bold(),
            "--blocking".cyan()
        );
    }

    let mut keys: Vec<&String> = env.keys().collect();
    keys.sort();
    for key in keys {
        println!("{}={}", key.cyan(), env[key]);
    }
    Ok(())
}
