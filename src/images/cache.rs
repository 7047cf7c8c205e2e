//! In-memory bounded image cache.
//!
//! Holds encoded image payloads keyed by [`ImageKey`] under two
//! limits: a maximum entry count and a maximum total byte size. Eviction is
//! FIFO by insertion order. Re-storing a key counts as a fresh insertion, and
//! reads never change the order, so the set of survivors depends only on the
//! sequence of `store`/`remove` calls and the limits in force.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use closet_core::config::CacheConfig;
use closet_core::{ImageData, ImageKey};
use parking_lot::{Mutex, MutexGuard};

/// Count and byte limits for an [`ImageCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheLimits {
    pub max_count: usize,
    pub max_total_bytes: u64,
}

impl CacheLimits {
    pub fn new(max_count: usize, max_total_bytes: u64) -> Self {
        Self {
            max_count,
            max_total_bytes,
        }
    }
}

impl From<CacheConfig> for CacheLimits {
    fn from(cfg: CacheConfig) -> Self {
        Self::new(cfg.max_count, cfg.max_total_bytes)
    }
}

impl Default for CacheLimits {
    fn default() -> Self {
        CacheConfig::default().into()
    }
}

/// Point-in-time counters for an [`ImageCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub evictions: u64,
    pub entries: usize,
    pub total_bytes: u64,
}

struct CacheEntry {
    image: ImageData,
    seq: u64,
}

/// Everything guarded by the cache mutex.
struct CacheState {
    entries: HashMap<ImageKey, CacheEntry>,
    /// Insertion sequence -> key; the first entry is the next to evict.
    order: BTreeMap<u64, ImageKey>,
    total_bytes: u64,
    next_seq: u64,
    /// Bumped by every write that can make a cached or in-flight copy stale.
    generation: u64,
    limits: CacheLimits,
}

impl CacheState {
    fn new(limits: CacheLimits) -> Self {
        Self {
            entries: HashMap::new(),
            order: BTreeMap::new(),
            total_bytes: 0,
            next_seq: 0,
            generation: 0,
            limits,
        }
    }

    fn remove(&mut self, key: &ImageKey) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.order.remove(&entry.seq);
        self.total_bytes -= entry.image.size_bytes();
        Some(entry)
    }

    fn over_limits(&self) -> bool {
        self.entries.len() > self.limits.max_count || self.total_bytes > self.limits.max_total_bytes
    }

    /// Evict oldest-first until both limits hold. Returns how many went.
    fn evict_to_limits(&mut self) -> u64 {
        let mut evicted = 0;
        while self.over_limits() {
            let Some((_, key)) = self.order.pop_first() else {
                break;
            };
            if let Some(entry) = self.entries.remove(&key) {
                self.total_bytes -= entry.image.size_bytes();
                evicted += 1;
                tracing::debug!(%key, bytes = entry.image.size_bytes(), "Evicted image from cache");
            }
        }
        evicted
    }
}

/// Thread-safe, capacity-bounded image cache.
///
/// All reads and writes go through one mutex, so eviction always runs in the
/// same critical section as the mutation that made it necessary. The lock is
/// never held across an `.await`.
pub struct ImageCache {
    state: Mutex<CacheState>,
    hits: AtomicU64,
    misses: AtomicU64,
    insertions: AtomicU64,
    evictions: AtomicU64,
}

impl ImageCache {
    pub fn new(limits: CacheLimits) -> Self {
        Self {
            state: Mutex::new(CacheState::new(limits)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            insertions: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Insert or replace the image under `key`, evicting older entries as
    /// needed.
    ///
    /// An image larger than `max_total_bytes` (or any image while
    /// `max_count` is zero) is not admitted; a previous entry under the same
    /// key is still dropped so the cache never serves stale bytes.
    pub fn store(&self, key: ImageKey, image: ImageData) {
        let mut state = self.state.lock();
        state.generation += 1;
        self.admit(state, key, image);
    }

    /// Current invalidation generation.
    ///
    /// Read it before fetching an image from the durable store and hand it to
    /// [`store_if_current`](Self::store_if_current) when writing the result
    /// back.
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    /// Write back an image read from the durable store, unless the cache was
    /// written or invalidated since `generation` was read.
    ///
    /// Returns whether the write-back happened. A rejected write-back leaves
    /// the cache untouched; the caller's copy may be stale and is simply not
    /// cached. Write-backs do not advance the generation themselves.
    pub fn store_if_current(&self, key: ImageKey, image: ImageData, generation: u64) -> bool {
        let state = self.state.lock();
        if state.generation != generation {
            tracing::debug!(%key, "Cache changed during load, skipping write-back");
            return false;
        }
        self.admit(state, key, image);
        true
    }

    fn admit(&self, mut state: MutexGuard<'_, CacheState>, key: ImageKey, image: ImageData) {
        let size = image.size_bytes();
        state.remove(&key);

        if state.limits.max_count == 0 || size > state.limits.max_total_bytes {
            tracing::debug!(%key, bytes = size, "Image not admitted to cache");
            return;
        }

        let seq = state.next_seq;
        state.next_seq += 1;
        state.order.insert(seq, key);
        state.total_bytes += size;
        state.entries.insert(key, CacheEntry { image, seq });
        let evicted = state.evict_to_limits();
        drop(state);

        self.insertions.fetch_add(1, Ordering::Relaxed);
        self.evictions.fetch_add(evicted, Ordering::Relaxed);
    }

    /// Look up an image. Does not affect eviction order.
    pub fn get(&self, key: &ImageKey) -> Option<ImageData> {
        let found = self
            .state
            .lock()
            .entries
            .get(key)
            .map(|entry| entry.image.clone());

        let counter = if found.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    pub fn contains(&self, key: &ImageKey) -> bool {
        self.state.lock().entries.contains_key(key)
    }

    /// Remove one entry. Removing an absent key is a no-op.
    pub fn remove(&self, key: &ImageKey) {
        let mut state = self.state.lock();
        state.generation += 1;
        state.remove(key);
    }

    pub fn remove_all(&self) {
        let mut state = self.state.lock();
        state.generation += 1;
        state.entries.clear();
        state.order.clear();
        state.total_bytes = 0;
    }

    pub fn limits(&self) -> CacheLimits {
        self.state.lock().limits
    }

    /// Replace both limits, evicting synchronously until compliant.
    pub fn set_limits(&self, limits: CacheLimits) {
        self.update_limits(|l| *l = limits);
    }

    pub fn set_max_count(&self, max_count: usize) {
        self.update_limits(|l| l.max_count = max_count);
    }

    pub fn set_max_total_bytes(&self, max_total_bytes: u64) {
        self.update_limits(|l| l.max_total_bytes = max_total_bytes);
    }

    fn update_limits(&self, update: impl FnOnce(&mut CacheLimits)) {
        let mut state = self.state.lock();
        update(&mut state.limits);
        let evicted = state.evict_to_limits();
        drop(state);
        self.evictions.fetch_add(evicted, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total_bytes(&self) -> u64 {
        self.state.lock().total_bytes
    }

    pub fn stats(&self) -> CacheStats {
        let (entries, total_bytes) = {
            let state = self.state.lock();
            (state.entries.len(), state.total_bytes)
        };
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            insertions: self.insertions.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries,
            total_bytes,
        }
    }
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new(CacheLimits::default())
    }
}
