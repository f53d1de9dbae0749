//! LRU memo of reachability queries, keyed by (tile, radius).
//! Safe to share between the walker thread and the path worker.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;

use crate::models::TilePosition;

pub const DEFAULT_REACH_CACHE_CAPACITY: usize = 1024;

type ReachMap = Arc<HashMap<TilePosition, i32>>;

pub struct ReachCache {
    capacity: usize,
    entries: Mutex<LruCache<(TilePosition, i32), ReachMap>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ReachCache {
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            capacity: cap.get(),
            entries: Mutex::new(LruCache::new(cap)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Cached result for the key, or `compute` on a miss.
    pub fn get_or_compute<F>(&self, from: TilePosition, radius: i32, compute: F) -> ReachMap
    where
        F: FnOnce() -> HashMap<TilePosition, i32>,
    {
        let key = (from, radius);
        if let Some(hit) = self.entries.lock().get(&key).cloned() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return hit;
        }
        // computed outside the lock; a racing insert for the same key wins
        let fresh = Arc::new(compute());
        let mut guard = self.entries.lock();
        if let Some(hit) = guard.get(&key).cloned() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return hit;
        }
        guard.put(key, Arc::clone(&fresh));
        self.misses.fetch_add(1, Ordering::Relaxed);
        fresh
    }

    pub fn hits(&self) -> u64 { self.hits.load(Ordering::Relaxed) }
    pub fn misses(&self) -> u64 { self.misses.load(Ordering::Relaxed) }
    pub fn len(&self) -> usize { self.entries.lock().len() }
    pub fn is_empty(&self) -> bool { self.len() == 0 }
    pub fn capacity(&self) -> usize { self.capacity }
}

impl Default for ReachCache {
    fn default() -> Self {
        Self::new(DEFAULT_REACH_CACHE_CAPACITY)
    }
}

#[allow(dead_code)]
fn _assert_send_sync() {
    fn assert_bound<T: Send + Sync>() {}
    assert_bound::<ReachCache>();
}
