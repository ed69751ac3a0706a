// this_file: crates/ufr-resolver/src/loader.rs

//! Document loading for one resolve call.
//!
//! A call starts on its requested root. The first fetch failure against a
//! custom root switches the whole call to the default root: the failure is
//! logged once, documents cached under the custom root are dropped and the
//! failed document is requested again from the default root. Failures
//! against the default root end the call.

use log::{trace, warn};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use ufr_core::utils::{decode_envelope, join_root, normalize_root};
use ufr_core::{DataSource, DocumentCache, Result, UfrError};

/// A document together with the cache key it was stored under.
pub(crate) struct Loaded<T> {
    pub key: String,
    pub document: Arc<T>,
}

pub(crate) struct CallLoader<'a> {
    source: &'a dyn DataSource,
    schema_version: u32,
    default_root: &'a str,
    root: RwLock<String>,
    fell_back: AtomicBool,
}

impl<'a> CallLoader<'a> {
    pub fn new(
        source: &'a dyn DataSource,
        schema_version: u32,
        default_root: &'a str,
        requested_root: Option<&str>,
    ) -> Self {
        let root = requested_root
            .map(normalize_root)
            .filter(|root| !root.is_empty())
            .unwrap_or(default_root);
        Self {
            source,
            schema_version,
            default_root,
            root: RwLock::new(root.to_string()),
            fell_back: AtomicBool::new(false),
        }
    }

    /// Root currently in use by the call
    pub fn root(&self) -> String {
        self.root.read().clone()
    }

    pub fn fell_back(&self) -> bool {
        self.fell_back.load(Ordering::SeqCst)
    }

    /// Load `path` through `cache`, falling back to the default root once.
    ///
    /// `others` are the remaining caches that may hold documents of a
    /// failing root.
    pub fn load<T>(
        &self,
        cache: &DocumentCache<T>,
        others: &[&dyn EvictRoot],
        path: &str,
    ) -> Result<Loaded<T>>
    where
        T: DeserializeOwned + Send + Sync,
    {
        let root = self.root();
        match self.load_from(cache, &root, path) {
            Err(err) if err.is_fetch_failure() && root != self.default_root => {
                self.fall_back(&root, &err, cache, others);
                self.load_from(cache, self.default_root, path)
            }
            outcome => outcome,
        }
    }

    fn load_from<T>(&self, cache: &DocumentCache<T>, root: &str, path: &str) -> Result<Loaded<T>>
    where
        T: DeserializeOwned + Send + Sync,
    {
        let key = join_root(root, path);
        let document = cache.get_or_fetch(&key, || {
            trace!(target: "ufr::loader", "Fetching {key} from {}", self.source.name());
            let body = self.source.fetch(root, path)?;
            decode_envelope(path, &body, self.schema_version)
        })?;
        Ok(Loaded { key, document })
    }

    fn fall_back<T>(
        &self,
        failed_root: &str,
        err: &UfrError,
        cache: &DocumentCache<T>,
        others: &[&dyn EvictRoot],
    ) {
        if !self.fell_back.swap(true, Ordering::SeqCst) {
            warn!(
                target: "ufr::loader",
                "Data root {failed_root} failed ({err}); falling back to {}",
                self.default_root
            );
        }

        let prefix = join_root(failed_root, "");
        let mut evicted = cache.evict_prefix(&prefix);
        for other in others {
            evicted += other.evict_root(&prefix);
        }
        if evicted > 0 {
            trace!(target: "ufr::loader", "Dropped {evicted} cached document(s) under {failed_root}");
        }

        let mut root = self.root.write();
        if *root == failed_root {
            *root = self.default_root.to_string();
        }
    }
}

/// Caches that can drop everything stored under one root.
pub(crate) trait EvictRoot: Sync {
    fn evict_root(&self, prefix: &str) -> usize;
}

impl<T: Send + Sync> EvictRoot for DocumentCache<T> {
    fn evict_root(&self, prefix: &str) -> usize {
        self.evict_prefix(prefix)
    }
}
