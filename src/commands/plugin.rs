//! Plugin registry management
//! Usage: moor plugin [list|add <name>|remove <name>]

use anyhow::Result;
use colored::Colorize;

use crate::config::{AtomicConfigStore, ConfigError};

fn store() -> AtomicConfigStore {
    AtomicConfigStore::new(AtomicConfigStore::default_path())
}

pub fn list() -> Result<()> {
    let doc = match store().read() {
        Ok(doc) => doc,
        Err(ConfigError::NotFound { .. }) => {
            println!("(no config file; no plugins registered)");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if doc.plugins.is_empty() {
        println!("(no plugins registered)");
        return Ok(());
    }

    println!("Registered plugins:");
    for plugin in &doc.plugins {
        println!("  {}", plugin.cyan());
    }
    Ok(())
}

pub fn add(name: String) -> Result<()> {
    if store().add_plugin(&name)? {
        println!("{} Added plugin {}", "✓".green().bold(), name.cyan());
    } else {
        println!("{} Plugin {} already registered", "─".dimmed(), name.cyan());
    }
    Ok(())
}

pub fn remove(name: String) -> Result<()> {
    if store().remove_plugin(&name)? {
        println!("{} Removed plugin {}", "✓".green().bold(), name.cyan());
    } else {
        println!("{} Plugin {} was not registered", "─".dimmed(), name.cyan());
    }
    Ok(())
}
