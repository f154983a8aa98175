//! Crash-safe config document store
//!
//! Writes never leave a truncated file behind: the previous file is copied to
//! a `.backup` sibling, the new document is serialized to a uniquely named
//! temporary file in the same directory, and the temp file is atomically
//! renamed over the target. A crash at any point leaves either the old or the
//! new file fully intact, and the backup gives one level of undo for a
//! corrupted document.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use super::document::ConfigDocument;
use super::lenient;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("config file {path} is not valid JSON (even after lenient parse)")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write config file {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no backup exists for {path}")]
    BackupUnavailable { path: PathBuf },
}

pub struct AtomicConfigStore {
    path: PathBuf,
}

impl AtomicConfigStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Resolve the config location: `MOOR_CONFIG` override, else the platform
    /// config directory.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var("MOOR_CONFIG") {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("moor")
            .join("config.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".backup");
        self.path.with_file_name(name)
    }

    /// Read and parse the document.
    ///
    /// Tries a strict JSON parse first; on failure, retries after the lenient
    /// comment/trailing-comma pass so hand-edited files keep working.
    pub fn read(&self) -> Result<ConfigDocument, ConfigError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound {
                    path: self.path.clone(),
                });
            }
            Err(e) => {
                return Err(ConfigError::Write {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };

        match serde_json::from_str(&content) {
            Ok(doc) => Ok(doc),
            Err(strict_err) => {
                debug!(path = %self.path.display(), "strict parse failed, retrying leniently");
                serde_json::from_str(&lenient::relax(&content)).map_err(|_| ConfigError::Parse {
                    path: self.path.clone(),
                    source: strict_err,
                })
            }
        }
    }

    /// Write the document via backup + temp file + atomic rename.
    pub fn write(&self, doc: &ConfigDocument) -> Result<(), ConfigError> {
        let write_err = |source: std::io::Error| ConfigError::Write {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(write_err)?;

        // Back up the previous file before touching anything else, so a
        // failed write still has a restore point.
        if self.path.exists() {
            std::fs::copy(&self.path, self.backup_path()).map_err(write_err)?;
        }

        let content = serde_json::to_string_pretty(doc).map_err(|e| ConfigError::Write {
            path: self.path.clone(),
            source: std::io::Error::other(e),
        })?;

        // Temp file must live in the target directory; rename is only atomic
        // within one filesystem.
        let temp = tempfile::NamedTempFile::new_in(&dir).map_err(write_err)?;
        std::fs::write(temp.path(), content.as_bytes()).map_err(write_err)?;
        temp.persist(&self.path)
            .map_err(|e| write_err(e.error))?;

        Ok(())
    }

    /// Move the backup file back over the config file.
    pub fn restore_backup(&self) -> Result<(), ConfigError> {
        let backup = self.backup_path();
        if !backup.exists() {
            return Err(ConfigError::BackupUnavailable {
                path: self.path.clone(),
            });
        }
        std::fs::rename(&backup, &self.path).map_err(|e| ConfigError::Write {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Read the document for a read-modify-write cycle.
    ///
    /// A missing file yields the default document. A parse failure first
    /// attempts a backup restore; only when that fails too does this fall
    /// back to the default document, preserving user data where possible.
    pub fn read_or_recover(&self) -> Result<ConfigDocument, ConfigError> {
        match self.read() {
            Ok(doc) => Ok(doc),
            Err(ConfigError::NotFound { .. }) => Ok(ConfigDocument::default()),
            Err(ConfigError::Parse { .. }) => {
                debug!(path = %self.path.display(), "config corrupt, attempting backup restore");
                match self.restore_backup() {
                    Ok(()) => self.read().or_else(|_| Ok(ConfigDocument::default())),
                    Err(_) => Ok(ConfigDocument::default()),
                }
            }
            Err(other) => Err(other),
        }
    }

    /// Add a plugin to the registry. Returns true if it was newly added.
    pub fn add_plugin(&self, name: &str) -> Result<bool, ConfigError> {
        let mut doc = self.read_or_recover()?;
        if !doc.add_plugin(name) {
            return Ok(false);
        }
        self.write(&doc)?;
        Ok(true)
    }

    /// Remove a plugin from the registry. Returns true if it was present.
    pub fn remove_plugin(&self, name: &str) -> Result<bool, ConfigError> {
        let mut doc = self.read_or_recover()?;
        if !doc.remove_plugin(name) {
            return Ok(false);
        }
        self.write(&doc)?;
        Ok(true)
    }
}
