//! Bounded metadata cache
//!
//! Entries are evicted strictly in insertion order: a lookup counts as a hit
//! but never refreshes the entry. Re-inserting an existing key moves it to
//! the newest end. Every entry that leaves the cache has its media handle
//! released.

use chrono::{DateTime, Utc};
use lru::LruCache;
use serde::Serialize;
use soundflows_core::{MediaHandle, TrackRef};
use std::num::NonZeroUsize;
use std::time::Duration;
use tracing::debug;

/// Cache-owned view of one preloaded track
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CachedMedia {
    pub track: TrackRef,
    pub duration: Duration,
    pub loaded_at: DateTime<Utc>,
}

/// A cached media handle together with its metadata
pub struct CacheEntry {
    media: CachedMedia,
    handle: Box<dyn MediaHandle>,
}

impl CacheEntry {
    pub fn new(media: CachedMedia, handle: Box<dyn MediaHandle>) -> Self {
        Self { media, handle }
    }

    pub fn media(&self) -> &CachedMedia {
        &self.media
    }

    fn release(mut self) {
        self.handle.release();
    }
}

impl std::fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEntry")
            .field("media", &self.media)
            .finish_non_exhaustive()
    }
}

/// Capacity-bounded store of preloaded media, keyed by `category:fileName`
pub struct MetadataCache {
    entries: LruCache<String, CacheEntry>,
    hits: u64,
    misses: u64,
}

impl MetadataCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Look up an entry, counting the hit or miss
    ///
    /// Does not change eviction order.
    pub fn get(&mut self, key: &str) -> Option<&CacheEntry> {
        if self.entries.contains(key) {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        self.entries.peek(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains(key)
    }

    /// Insert as the newest entry
    ///
    /// An existing entry under the same key is replaced (its handle released).
    /// When the cache is full the oldest entry is evicted and its key returned.
    pub fn put(&mut self, key: impl Into<String>, entry: CacheEntry) -> Option<String> {
        let key = key.into();

        if let Some(previous) = self.entries.pop(&key) {
            previous.release();
        }

        let evicted = if self.entries.len() >= self.entries.cap().get() {
            self.evict_oldest()
        } else {
            None
        };

        self.entries.push(key, entry);
        evicted
    }

    /// Remove and release one entry
    pub fn remove(&mut self, key: &str) -> bool {
        match self.entries.pop(key) {
            Some(entry) => {
                entry.release();
                true
            }
            None => false,
        }
    }

    /// Change the capacity, evicting oldest entries that no longer fit
    ///
    /// Returns the number of evicted entries.
    pub fn resize(&mut self, capacity: NonZeroUsize) -> usize {
        let mut evicted = 0;
        while self.entries.len() > capacity.get() {
            if self.evict_oldest().is_none() {
                break;
            }
            evicted += 1;
        }
        self.entries.resize(capacity);
        evicted
    }

    /// Release every handle and empty the cache
    ///
    /// Hit and miss counters are kept.
    pub fn clear(&mut self) {
        while let Some((_, entry)) = self.entries.pop_lru() {
            entry.release();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Hit rate in percent; `0.0` before the first lookup
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            return 0.0;
        }
        self.hits as f64 / lookups as f64 * 100.0
    }

    /// Keys from oldest to newest
    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().rev().map(|(key, _)| key.clone()).collect()
    }

    /// Entries of one category, oldest first
    pub fn media_for(&self, category: &str) -> Vec<CachedMedia> {
        self.entries
            .iter()
            .rev()
            .filter(|(_, entry)| entry.media.track.category() == category)
            .map(|(_, entry)| entry.media.clone())
            .collect()
    }

    fn evict_oldest(&mut self) -> Option<String> {
        let (key, entry) = self.entries.pop_lru()?;
        debug!(key = %key, "Evicting cached media");
        entry.release();
        Some(key)
    }
}

impl Drop for MetadataCache {
    fn drop(&mut self) {
        self.clear();
    }
}

impl std::fmt::Debug for MetadataCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingHandle(Arc<AtomicUsize>);

    impl MediaHandle for CountingHandle {
        fn release(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn entry(key: &str, released: &Arc<AtomicUsize>) -> CacheEntry {
        let (category, file) = key.split_once(':').unwrap_or(("test", key));
        CacheEntry::new(
            CachedMedia {
                track: TrackRef::new(category, file),
                duration: Duration::from_secs(30),
                loaded_at: Utc::now(),
            },
            Box::new(CountingHandle(Arc::clone(released))),
        )
    }

    fn cache(capacity: usize) -> MetadataCache {
        MetadataCache::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn evicts_first_inserted_when_full() {
        let released = Arc::new(AtomicUsize::new(0));
        let mut cache = cache(3);

        for key in ["a:1", "a:2", "a:3"] {
            assert_eq!(cache.put(key, entry(key, &released)), None);
        }
        let evicted = cache.put("a:4", entry("a:4", &released));

        assert_eq!(evicted.as_deref(), Some("a:1"));
        assert_eq!(cache.keys(), vec!["a:2", "a:3", "a:4"]);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn hits_do_not_refresh_entries() {
        let released = Arc::new(AtomicUsize::new(0));
        let mut cache = cache(2);
        cache.put("a:1", entry("a:1", &released));
        cache.put("a:2", entry("a:2", &released));

        assert!(cache.get("a:1").is_some());
        cache.put("a:3", entry("a:3", &released));

        assert!(!cache.contains("a:1"));
        assert!(cache.contains("a:2"));
        assert!(cache.contains("a:3"));
    }

    #[test]
    fn reinsert_moves_key_to_newest_and_releases_old_handle() {
        let released = Arc::new(AtomicUsize::new(0));
        let mut cache = cache(2);
        cache.put("a:1", entry("a:1", &released));
        cache.put("a:2", entry("a:2", &released));

        assert_eq!(cache.put("a:1", entry("a:1", &released)), None);
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert_eq!(cache.keys(), vec!["a:2", "a:1"]);

        cache.put("a:3", entry("a:3", &released));
        assert_eq!(cache.keys(), vec!["a:1", "a:3"]);
    }

    #[test]
    fn counts_hits_and_misses() {
        let released = Arc::new(AtomicUsize::new(0));
        let mut cache = cache(2);
        assert_eq!(cache.hit_rate(), 0.0);

        cache.put("a:1", entry("a:1", &released));
        assert!(cache.get("a:1").is_some());
        assert!(cache.get("a:1").is_some());
        assert!(cache.get("a:9").is_none());

        assert_eq!(cache.hits(), 2);
        assert_eq!(cache.misses(), 1);
        assert!((cache.hit_rate() - 66.666).abs() < 0.01);
    }

    #[test]
    fn resize_evicts_oldest_and_releases() {
        let released = Arc::new(AtomicUsize::new(0));
        let mut cache = cache(4);
        for key in ["a:1", "a:2", "a:3", "a:4"] {
            cache.put(key, entry(key, &released));
        }

        let evicted = cache.resize(NonZeroUsize::new(2).unwrap());

        assert_eq!(evicted, 2);
        assert_eq!(cache.keys(), vec!["a:3", "a:4"]);
        assert_eq!(cache.capacity(), 2);
        assert_eq!(released.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn clear_and_drop_release_every_handle() {
        let released = Arc::new(AtomicUsize::new(0));
        let mut cache = cache(4);
        cache.put("a:1", entry("a:1", &released));
        cache.put("a:2", entry("a:2", &released));

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(released.load(Ordering::SeqCst), 2);

        cache.put("a:3", entry("a:3", &released));
        drop(cache);
        assert_eq!(released.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn media_for_filters_by_category() {
        let released = Arc::new(AtomicUsize::new(0));
        let mut cache = cache(4);
        cache.put("Rain:a.mp3", entry("Rain:a.mp3", &released));
        cache.put("Fire:b.mp3", entry("Fire:b.mp3", &released));
        cache.put("Rain:c.mp3", entry("Rain:c.mp3", &released));

        let rain: Vec<String> = cache
            .media_for("Rain")
            .into_iter()
            .map(|media| media.track.file_name().to_string())
            .collect();
        assert_eq!(rain, vec!["a.mp3", "c.mp3"]);
    }

    proptest! {
        /// Property: size never exceeds capacity and every displaced handle is released
        #[test]
        fn size_bounded_and_displaced_handles_released(
            capacity in 1usize..8,
            keys in prop::collection::vec(0u8..16, 0..64)
        ) {
            let released = Arc::new(AtomicUsize::new(0));
            let mut cache = cache(capacity);

            for key in &keys {
                let key = format!("c:{key}");
                cache.put(key.clone(), entry(&key, &released));
                prop_assert!(cache.len() <= capacity);
            }

            prop_assert_eq!(released.load(Ordering::SeqCst) + cache.len(), keys.len());
        }

        /// Property: after capacity + 1 distinct inserts the first key is gone
        #[test]
        fn first_key_evicted_after_overflow(capacity in 1usize..10) {
            let released = Arc::new(AtomicUsize::new(0));
            let mut cache = cache(capacity);

            for i in 0..=capacity {
                let key = format!("c:{i}");
                cache.put(key.clone(), entry(&key, &released));
            }

            prop_assert!(!cache.contains("c:0"));
            for i in 1..=capacity {
                let key = format!("c:{i}");
                prop_assert!(cache.contains(&key));
            }
        }
    }
}
