//! In-memory cache for API read responses
//!
//! Entries live until an invalidation rule or a clear removes them; there is
//! no TTL and no size-based eviction. Values go in and come out as deep copies
//! so a caller mutating its result can never corrupt what later readers see.

pub mod invalidation;
pub mod key;

use std::collections::HashMap;

use serde_json::Value;

pub use invalidation::{InvalidationOutcome, InvalidationRule, InvalidationRules};
pub use key::RequestKey;

/// Decoded response bodies keyed by request key
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: HashMap<RequestKey, Value>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Independent copy of the cached value for `key`
    pub fn get(&self, key: &RequestKey) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    /// Store a copy of `value`, replacing any previous entry
    pub fn set(&mut self, key: RequestKey, value: &Value) {
        self.entries.insert(key, value.clone());
    }

    pub fn contains(&self, key: &RequestKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove one entry. Returns whether it existed.
    pub fn delete(&mut self, key: &RequestKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Remove every entry whose key starts with `prefix`
    pub fn delete_by_prefix(&mut self, prefix: &str) -> Vec<RequestKey> {
        let doomed: Vec<RequestKey> = self
            .entries
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();

        for key in &doomed {
            self.entries.remove(key);
        }
        doomed
    }

    /// Remove everything. Returns the number of entries dropped.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Live keys in sorted order
    pub fn keys(&self) -> Vec<RequestKey> {
        let mut keys: Vec<RequestKey> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn stats(&self) -> CacheStats {
        let total_size_bytes = self
            .entries
            .values()
            .map(|v| serde_json::to_vec(v).map(|b| b.len()).unwrap_or(0))
            .sum();

        CacheStats {
            entries: self.entries.len(),
            total_size_bytes,
        }
    }
}

/// Statistics about cache state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub total_size_bytes: usize,
}
