//! In-memory default cache
//!
//! Stands in for the platform's standard response cache:
//! - keyed by URL, `GET` requests only
//! - byte capacity with LRU (Least Recently Used) eviction
//! - entries larger than 5% of capacity are not stored
//! - responses with `StoragePolicy::NotAllowed` are never stored

use crate::cache::{CacheRequest, CachedResponse, ResponseCache, StoragePolicy};
use crate::config::DEFAULT_CACHE_CAPACITY;
use http::Method;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Largest single entry, as a fraction of capacity
const MAX_ENTRY_FRACTION: usize = 20;

/// Statistics about cache usage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of entries evicted
    pub evictions: u64,
    /// Current number of entries
    pub entries: usize,
    /// Current usage in bytes
    pub usage: usize,
}

/// Queue entries allowed beyond one per live response before compaction
const LRU_SLACK: usize = 64;

#[derive(Debug)]
struct Entry {
    response: CachedResponse,
    /// Stamp of this entry's live position in `lru_order`
    stamp: u64,
}

#[derive(Debug, Default)]
struct Entries {
    responses: HashMap<String, Entry>,
    /// Oldest at front; positions whose stamp no longer matches are stale
    lru_order: VecDeque<(u64, String)>,
    next_stamp: u64,
    usage: usize,
}

impl Entries {
    fn insert(&mut self, url: String, response: CachedResponse) {
        self.usage += response.cost();
        self.responses.insert(url.clone(), Entry { response, stamp: 0 });
        self.touch(&url);
    }

    fn touch(&mut self, url: &str) {
        let Some(entry) = self.responses.get_mut(url) else {
            return;
        };
        let stamp = self.next_stamp;
        self.next_stamp += 1;
        entry.stamp = stamp;
        self.lru_order.push_back((stamp, url.to_string()));

        if self.lru_order.len() > 2 * self.responses.len() + LRU_SLACK {
            let responses = &self.responses;
            self.lru_order
                .retain(|(stamp, url)| responses.get(url).is_some_and(|e| e.stamp == *stamp));
        }
    }

    fn remove(&mut self, url: &str) -> Option<CachedResponse> {
        let removed = self.responses.remove(url)?.response;
        self.usage -= removed.cost();
        Some(removed)
    }

    /// Take the least recently used URL off the queue
    fn pop_oldest(&mut self) -> Option<String> {
        while let Some((stamp, url)) = self.lru_order.pop_front() {
            if self.responses.get(&url).is_some_and(|e| e.stamp == stamp) {
                return Some(url);
            }
        }
        None
    }
}

/// URL-keyed in-memory response cache
#[derive(Debug)]
pub struct MemoryCache {
    entries: Mutex<Entries>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl MemoryCache {
    /// Create a cache holding at most `capacity` bytes
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(Entries::default()),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Number of stored responses
    pub fn len(&self) -> usize {
        self.entries.lock().responses.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: entries.responses.len(),
            usage: entries.usage,
        }
    }

    fn evict_to_capacity(&self, entries: &mut Entries) {
        while entries.usage > self.capacity {
            let Some(oldest) = entries.pop_oldest() else {
                break;
            };
            debug!("Evicting cached response: {}", oldest);
            entries.remove(&oldest);
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl ResponseCache for MemoryCache {
    fn cached_response(&self, request: &CacheRequest) -> Option<CachedResponse> {
        if request.method() != Method::GET {
            return None;
        }

        let url = request.uri().to_string();
        let mut entries = self.entries.lock();

        match entries.responses.get(&url).map(|e| e.response.clone()) {
            Some(response) => {
                entries.touch(&url);
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(response)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn store_cached_response(&self, response: CachedResponse, request: &CacheRequest) {
        if request.method() != Method::GET {
            return;
        }

        let url = request.uri().to_string();
        let mut entries = self.entries.lock();

        // a rejected replacement still invalidates what was stored before
        entries.remove(&url);

        if response.storage_policy == StoragePolicy::NotAllowed {
            return;
        }
        let cost = response.cost();
        if cost > self.capacity / MAX_ENTRY_FRACTION {
            debug!("Response too large to cache ({} bytes)", cost);
            return;
        }

        entries.insert(url, response);
        self.evict_to_capacity(&mut entries);
    }

    fn remove_cached_response(&self, request: &CacheRequest) {
        let url = request.uri().to_string();
        self.entries.lock().remove(&url);
    }

    fn remove_all_cached_responses(&self) {
        let mut entries = self.entries.lock();
        entries.responses.clear();
        entries.lru_order.clear();
        entries.usage = 0;
    }

    fn current_memory_usage(&self) -> usize {
        self.entries.lock().usage
    }

    fn memory_capacity(&self) -> usize {
        self.capacity
    }
}
