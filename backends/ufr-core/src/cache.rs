// this_file: backends/ufr-core/src/cache.rs

//! Document caching with request coalescing.
//!
//! Completed documents are shared read-only through `Arc`. A request for a
//! key that is already being fetched attaches to the in-flight cell instead
//! of issuing its own I/O; the cell is dropped from the map once it settles,
//! whether the fetch succeeded or failed.
//!
//! Evicting a prefix also covers fetches still running under it: a document
//! whose fetch started before the eviction is handed to its callers but
//! never stored.

use crate::Result;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

type Flight<T> = Arc<OnceCell<Result<Arc<T>>>>;

/// Cache of decoded documents keyed by request key.
pub struct DocumentCache<T> {
    /// Settled documents
    ready: DashMap<String, Arc<T>>,

    /// Requests currently being fetched
    in_flight: DashMap<String, Flight<T>>,

    /// Bumped by `clear` so fetches started earlier do not repopulate
    generation: AtomicU64,

    /// Prefixes evicted since the last `clear`, oldest first
    evictions: RwLock<Vec<String>>,
}

impl<T> DocumentCache<T> {
    pub fn new() -> Self {
        Self {
            ready: DashMap::new(),
            in_flight: DashMap::new(),
            generation: AtomicU64::new(0),
            evictions: RwLock::new(Vec::new()),
        }
    }

    /// Cached document, if settled
    pub fn get(&self, key: &str) -> Option<Arc<T>> {
        self.ready.get(key).map(|entry| entry.clone())
    }

    /// Return the cached document or run `fetch`, coalescing with any
    /// identical request already in flight.
    pub fn get_or_fetch<F>(&self, key: &str, fetch: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        if let Some(hit) = self.get(key) {
            return Ok(hit);
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let evicted_before = self.evictions.read().len();
        let flight = self
            .in_flight
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        // Another caller may have settled the key between the two lookups.
        if let Some(hit) = self.get(key) {
            self.settle(key, &flight);
            return Ok(hit);
        }

        let outcome = flight.get_or_init(|| fetch().map(Arc::new)).clone();
        if let Ok(document) = &outcome {
            // Held across the insert so an eviction cannot slip in between.
            let evictions = self.evictions.read();
            let stale = self.generation.load(Ordering::SeqCst) != generation
                || evictions
                    .get(evicted_before..)
                    .map_or(true, |recent| recent.iter().any(|p| key.starts_with(p.as_str())));
            if !stale {
                self.ready
                    .entry(key.to_string())
                    .or_insert_with(|| document.clone());
            }
        }
        self.settle(key, &flight);
        outcome
    }

    fn settle(&self, key: &str, flight: &Flight<T>) {
        self.in_flight
            .remove_if(key, |_, current| Arc::ptr_eq(current, flight));
    }

    /// Drop every settled document whose key starts with `prefix`, and
    /// keep fetches already running under it from being stored.
    pub fn evict_prefix(&self, prefix: &str) -> usize {
        let mut evictions = self.evictions.write();
        evictions.push(prefix.to_string());
        self.in_flight.retain(|key, _| !key.starts_with(prefix));
        let before = self.ready.len();
        self.ready.retain(|key, _| !key.starts_with(prefix));
        before - self.ready.len()
    }

    /// Forget all documents. Fetches still running finish for their
    /// callers but are not cached.
    pub fn clear(&self) {
        let mut evictions = self.evictions.write();
        self.generation.fetch_add(1, Ordering::SeqCst);
        evictions.clear();
        self.ready.clear();
        self.in_flight.clear();
    }

    pub fn len(&self) -> usize {
        self.ready.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ready.is_empty()
    }

    /// Requests currently in flight
    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }
}

impl<T> Default for DocumentCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub bucket_count: usize,
    pub font_meta_count: usize,
    pub coverage_set_count: usize,
    pub in_flight_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UfrError;
    use rayon::prelude::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_hit_skips_fetch() {
        let cache = DocumentCache::new();
        let calls = AtomicUsize::new(0);
        let fetch = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(42u32)
        };
        assert_eq!(*cache.get_or_fetch("k", fetch).unwrap(), 42);
        assert_eq!(*cache.get_or_fetch("k", fetch).unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.pending(), 0);
    }

    #[test]
    fn test_failure_is_not_cached() {
        let cache: DocumentCache<u32> = DocumentCache::new();
        let err = cache
            .get_or_fetch("k", || Err(UfrError::fetch("k", "offline")))
            .unwrap_err();
        assert!(matches!(err, UfrError::Fetch { .. }));
        assert!(cache.is_empty());
        assert_eq!(cache.pending(), 0);
        assert_eq!(*cache.get_or_fetch("k", || Ok(7)).unwrap(), 7);
    }

    #[test]
    fn test_concurrent_requests_coalesce() {
        let cache = DocumentCache::new();
        let calls = AtomicUsize::new(0);
        let values: Vec<u32> = (0..16)
            .into_par_iter()
            .map(|_| {
                *cache
                    .get_or_fetch("shared", || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        std::thread::sleep(Duration::from_millis(20));
                        Ok(5u32)
                    })
                    .unwrap()
            })
            .collect();
        assert!(values.iter().all(|&v| v == 5));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.pending(), 0);
    }

    #[test]
    fn test_evict_prefix_and_clear() {
        let cache = DocumentCache::new();
        cache.get_or_fetch("custom/a", || Ok(1u8)).unwrap();
        cache.get_or_fetch("custom/b", || Ok(2u8)).unwrap();
        cache.get_or_fetch("cdn/a", || Ok(3u8)).unwrap();
        assert_eq!(cache.evict_prefix("custom/"), 2);
        assert!(cache.get("cdn/a").is_some());
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_eviction_drops_fetches_in_flight() {
        let cache: DocumentCache<u8> = DocumentCache::new();
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        std::thread::scope(|scope| {
            let shared = &cache;
            let slow = scope.spawn(move || {
                shared.get_or_fetch("custom/x", || {
                    started_tx.send(()).unwrap();
                    release_rx.recv().unwrap();
                    Ok(1)
                })
            });

            started_rx.recv().unwrap();
            assert_eq!(cache.evict_prefix("custom/"), 0);
            release_tx.send(()).unwrap();

            // The caller still gets its document; the cache does not keep it.
            assert_eq!(*slow.join().unwrap().unwrap(), 1);
        });

        assert!(cache.get("custom/x").is_none());
        assert_eq!(cache.pending(), 0);

        cache.get_or_fetch("cdn/y", || Ok(2)).unwrap();
        assert!(cache.get("cdn/y").is_some());
        cache.get_or_fetch("custom/x", || Ok(3)).unwrap();
        assert_eq!(cache.get("custom/x").as_deref(), Some(&3));
    }
}
