use serde::{Deserialize, Serialize};

/// A computed diff for a single file, paired with the hash of its content.
///
/// The hash makes staleness detectable: a cached result is only valid while
/// the hash of a freshly computed diff matches it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiffResult {
    /// Unified diff text split into lines
    pub lines: Vec<String>,
    /// SHA-256 hex digest of the diff text
    pub content_hash: String,
}

impl DiffResult {
    /// Build a result from raw unified diff text, hashing it.
    pub fn from_text(text: &str) -> Self {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        let content_hash = format!("{:x}", hasher.finalize());

        Self {
            lines: text.lines().map(|l| l.to_string()).collect(),
            content_hash,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
