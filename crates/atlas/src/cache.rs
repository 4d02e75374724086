//! Query result caching
//!
//! A connection with a cache attached stores the rows of cached fetches under
//! a key derived from the SQL text and its parameters. [`MemoryCache`] keeps
//! entries in process with per-entry expiry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::query::CacheLength;
use crate::value::{DatabaseValue, Row};

/// Storage for cached result sets
pub trait ResultCache: Send + Sync {
    /// Rows stored under `key`, `None` on a miss or an expired entry
    fn fetch(&self, key: &str) -> Option<Vec<Row>>;

    /// Store rows under `key` for `length`; `CacheLength::Never` stores nothing
    fn save(&self, key: &str, rows: Vec<Row>, length: CacheLength);

    fn contains(&self, key: &str) -> bool {
        self.fetch(key).is_some()
    }

    fn remove(&self, key: &str) -> bool;

    fn clear(&self);
}

/// Cache key for a statement: blake3 of the cache length, the SQL and its
/// flattened parameters
pub fn cache_key(sql: &str, length: CacheLength, params: &[DatabaseValue]) -> String {
    let mut material = format!("{}__{}__", i64::from(length), sql);
    let mut flat = Vec::new();
    for param in params {
        param.flatten_into(&mut flat);
    }
    for value in flat {
        material.push('_');
        material.push_str(&value.to_string());
    }
    hex::encode(blake3::hash(material.as_bytes()).as_bytes())
}

#[derive(Debug, Clone)]
struct CacheEntry {
    rows: Vec<Row>,
    created_at: Instant,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(rows: Vec<Row>, ttl: Option<Duration>) -> Self {
        let now = Instant::now();
        Self {
            rows,
            created_at: now,
            expires_at: ttl.map(|ttl| now + ttl),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.map_or(false, |exp| Instant::now() > exp)
    }
}

/// Hit/miss counters for a [`MemoryCache`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// In-process result cache
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, CacheEntry>,
    max_entries: Option<usize>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache holding at most `max_entries`, evicting the oldest entry first
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            max_entries: Some(max_entries),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }

    fn prune_expired(&self) {
        self.entries.retain(|_, entry| !entry.is_expired());
    }

    fn evict_if_full(&self) {
        let Some(max_entries) = self.max_entries else {
            return;
        };
        while self.entries.len() >= max_entries.max(1) {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|entry| entry.value().created_at)
                .map(|entry| entry.key().clone());
            match oldest {
                Some(key) => {
                    tracing::trace!("Evicting cached result {}", key);
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }
}

impl ResultCache for MemoryCache {
    fn fetch(&self, key: &str) -> Option<Vec<Row>> {
        let found = self
            .entries
            .get(key)
            .map(|entry| (!entry.is_expired()).then(|| entry.rows.clone()));
        // read guard must be dropped before remove
        let found = match found {
            Some(None) => {
                self.entries.remove(key);
                None
            }
            other => other.flatten(),
        };
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    fn save(&self, key: &str, rows: Vec<Row>, length: CacheLength) {
        if !length.is_cached() {
            return;
        }
        self.prune_expired();
        if !self.entries.contains_key(key) {
            self.evict_if_full();
        }
        self.entries.insert(key.to_string(), CacheEntry::new(rows, length.ttl()));
    }

    fn contains(&self, key: &str) -> bool {
        self.entries.get(key).map_or(false, |entry| !entry.is_expired())
    }

    fn remove(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    fn clear(&self) {
        self.entries.clear();
    }
}
