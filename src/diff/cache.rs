//! Content-addressed diff cache
//!
//! Caches computed diffs keyed by file path. Boundedness is the only eviction
//! guarantee: when the cache grows past capacity, the oldest-inserted quarter
//! of entries is dropped. Strict LRU ordering is not a correctness
//! requirement here, only memory boundedness.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

use crate::models::DiffResult;

/// Default number of cached per-file diffs.
pub const DEFAULT_CAPACITY: usize = 128;

#[derive(Debug)]
pub struct DiffCache {
    entries: HashMap<PathBuf, DiffResult>,
    insertion_order: VecDeque<PathBuf>,
    capacity: usize,
}

impl Default for DiffCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl DiffCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            insertion_order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, key: &Path) -> Option<&DiffResult> {
        self.entries.get(key)
    }

    /// Insert or replace the cached diff for a file.
    pub fn put(&mut self, key: PathBuf, value: DiffResult) {
        if self.entries.insert(key.clone(), value).is_none() {
            self.insertion_order.push_back(key);
        }
        self.evict_if_over_capacity();
    }

    /// Drop the entry for one file, if present.
    pub fn invalidate(&mut self, key: &Path) {
        if self.entries.remove(key).is_some() {
            self.insertion_order.retain(|k| k != key);
        }
    }

    /// Drop every cached entry. Called on staging, commit, and branch
    /// operations, which can change every file's diff at once.
    pub fn invalidate_all(&mut self) {
        self.entries.clear();
        self.insertion_order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_if_over_capacity(&mut self) {
        if self.entries.len() <= self.capacity {
            return;
        }
        // Drop the oldest-inserted quarter, at least one entry.
        let to_drop = (self.capacity / 4).max(1);
        for _ in 0..to_drop {
            if let Some(key) = self.insertion_order.pop_front() {
                self.entries.remove(&key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diff(text: &str) -> DiffResult {
        DiffResult::from_text(text)
    }

    #[test]
    fn test_put_and_get() {
        let mut cache = DiffCache::new(4);
        cache.put(PathBuf::from("a.rs"), diff("+a"));

        assert!(cache.get(Path::new("a.rs")).is_some());
        assert!(cache.get(Path::new("b.rs")).is_none());
    }

    #[test]
    fn test_put_replaces_existing_entry() {
        let mut cache = DiffCache::new(4);
        cache.put(PathBuf::from("a.rs"), diff("+old"));
        cache.put(PathBuf::from("a.rs"), diff("+new"));

        assert_eq!(cache.len(), 1);
        let cached = cache.get(Path::new("a.rs")).unwrap();
        assert_eq!(cached.lines, vec!["+new"]);
    }

    #[test]
    fn test_invalidate_single_entry() {
        let mut cache = DiffCache::new(4);
        cache.put(PathBuf::from("a.rs"), diff("+a"));
        cache.put(PathBuf::from("b.rs"), diff("+b"));

        cache.invalidate(Path::new("a.rs"));
        assert!(cache.get(Path::new("a.rs")).is_none());
        assert!(cache.get(Path::new("b.rs")).is_some());
    }

    #[test]
    fn test_invalidate_all() {
        let mut cache = DiffCache::new(4);
        cache.put(PathBuf::from("a.rs"), diff("+a"));
        cache.put(PathBuf::from("b.rs"), diff("+b"));

        cache.invalidate_all();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_eviction_bounds_size() {
        let mut cache = DiffCache::new(8);
        for i in 0..100 {
            cache.put(PathBuf::from(format!("file-{i}.rs")), diff("+x"));
        }
        assert!(cache.len() <= 8);
        // Most recent insert survives eviction.
        assert!(cache.get(Path::new("file-99.rs")).is_some());
    }

    #[test]
    fn test_eviction_drops_oldest_inserted() {
        let mut cache = DiffCache::new(4);
        for i in 0..5 {
            cache.put(PathBuf::from(format!("file-{i}.rs")), diff("+x"));
        }
        // Capacity 4, fifth insert evicts the oldest entry.
        assert!(cache.get(Path::new("file-0.rs")).is_none());
        assert!(cache.get(Path::new("file-4.rs")).is_some());
    }
}
