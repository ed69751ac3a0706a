// this_file: backends/ufr-core/src/source.rs

//! In-memory data source for embedded bundles and tests.

use crate::traits::DataSource;
use crate::utils::join_root;
use crate::{Result, UfrError};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Documents held in memory, keyed by `root/path`.
///
/// Every fetch is counted and logged so callers can assert on I/O.
#[derive(Default)]
pub struct MemorySource {
    documents: DashMap<String, String>,
    fetches: AtomicUsize,
    fetch_log: Mutex<Vec<String>>,
    latency: Option<Duration>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every fetch, to widen race windows.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Store a raw document body.
    pub fn insert(&self, root: &str, path: &str, body: impl Into<String>) {
        self.documents.insert(join_root(root, path), body.into());
    }

    /// Store `payload` wrapped in a `[version, payload]` envelope.
    pub fn insert_document<T: Serialize>(
        &self,
        root: &str,
        path: &str,
        version: u32,
        payload: &T,
    ) -> Result<()> {
        let body = serde_json::to_string(&(version, payload))
            .map_err(|e| UfrError::invalid_document(path, e))?;
        self.insert(root, path, body);
        Ok(())
    }

    /// Drop one document so later fetches of it fail.
    pub fn remove(&self, root: &str, path: &str) {
        self.documents.remove(&join_root(root, path));
    }

    /// Number of fetches served or failed so far
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Every requested `root/path`, in request order
    pub fn fetched(&self) -> Vec<String> {
        self.fetch_log.lock().clone()
    }

    pub fn reset_counters(&self) {
        self.fetches.store(0, Ordering::SeqCst);
        self.fetch_log.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl DataSource for MemorySource {
    fn fetch(&self, root: &str, path: &str) -> Result<String> {
        let key = join_root(root, path);
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.fetch_log.lock().push(key.clone());

        if let Some(latency) = self.latency {
            std::thread::sleep(latency);
        }

        self.documents
            .get(&key)
            .map(|body| body.value().clone())
            .ok_or_else(|| UfrError::fetch(key, "not found"))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_counts_hits_and_misses() {
        let source = MemorySource::new();
        source.insert("data/", "a.json", "[1,{}]");

        assert_eq!(source.fetch("data", "a.json").unwrap(), "[1,{}]");
        assert!(matches!(
            source.fetch("data", "b.json"),
            Err(UfrError::Fetch { .. })
        ));
        assert_eq!(source.fetch_count(), 2);
        assert_eq!(source.fetched(), vec!["data/a.json", "data/b.json"]);

        source.reset_counters();
        assert_eq!(source.fetch_count(), 0);
    }

    #[test]
    fn test_insert_document_wraps_envelope() {
        let source = MemorySource::new();
        source
            .insert_document("r", "x.json", 3, &vec![1, 2])
            .unwrap();
        assert_eq!(source.fetch("r", "x.json").unwrap(), "[3,[1,2]]");
    }
}
