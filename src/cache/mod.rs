//! Compute-or-load memoization of project identifiers.
//!
//! Entries live in a [`BlobStore`] as tab-indented JSON arrays. A missing
//! entry or a literal `null` payload is a miss; a miss runs the compute
//! function once and persists its result. There is no cross-process lock:
//! two processes sharing a cache directory may both compute and race on
//! the write.

mod store;

pub use store::{BlobStore, FsBlobStore, MemoryBlobStore};

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::OnceCell;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::Identifier;

/// Whole-project identifier snapshot.
pub const IDENTIFY_KEY: &str = "identify.json";

/// Test-scope identifier snapshot.
pub const TEST_IDENTIFY_KEY: &str = "tidentify.json";

/// Errors that can occur while loading or persisting cache entries.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache i/o error for {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode cache entry {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("identifier computation failed: {0}")]
    Compute(#[source] anyhow::Error),
    #[error("cache lock poisoned")]
    Poisoned,
}

/// Serialize `value` as pretty JSON indented with tabs.
pub fn to_tab_indented_json<T: Serialize>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(buf)
}

/// Store-backed identifier cache with an in-process memo.
pub struct IdentifierCache<S: BlobStore> {
    store: S,
    /// One slot per cache key. The map lock is only held to find a slot;
    /// computing fills the slot under its own once-lock.
    memory: Mutex<HashMap<String, Arc<OnceCell<Vec<Identifier>>>>>,
}

impl<S: BlobStore> IdentifierCache<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            memory: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Return the identifiers stored under `key`, computing and persisting
    /// them on a miss.
    ///
    /// `compute` runs at most once per key for the lifetime of this cache,
    /// even if persisting its result fails. Concurrent callers of the same
    /// key wait for the running computation; other keys are not blocked,
    /// and `compute` may itself load a different key. A failed or panicking
    /// computation leaves the key empty, so a later call retries it. A
    /// payload that does not decode is logged and treated as a miss.
    pub fn load_or_compute<F>(&self, key: &str, compute: F) -> Result<Vec<Identifier>, CacheError>
    where
        F: FnOnce() -> anyhow::Result<Vec<Identifier>>,
    {
        let slot = self.slot(key);
        let identifiers = slot.get_or_try_init(|| self.load_uncached(key, compute))?;
        Ok(identifiers.clone())
    }

    fn slot(&self, key: &str) -> Arc<OnceCell<Vec<Identifier>>> {
        // Nothing runs under this lock that can panic mid-update.
        let mut memory = self.memory.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(memory.entry(key.to_string()).or_default())
    }

    fn load_uncached<F>(&self, key: &str, compute: F) -> Result<Vec<Identifier>, CacheError>
    where
        F: FnOnce() -> anyhow::Result<Vec<Identifier>>,
    {
        if let Some(identifiers) = self.read_entry(key)? {
            debug!(key, count = identifiers.len(), "identifier cache hit");
            return Ok(identifiers);
        }

        debug!(key, "identifier cache miss, computing");
        let identifiers = compute().map_err(CacheError::Compute)?;

        let payload = to_tab_indented_json(&identifiers).map_err(|source| CacheError::Encode {
            key: key.to_string(),
            source,
        })?;
        if let Err(e) = self.store.write(key, &payload) {
            warn!(key, error = %e, "failed to persist identifier cache entry");
        }

        Ok(identifiers)
    }

    /// Decode the stored entry; `null`, absent and undecodable all read as
    /// `None`.
    fn read_entry(&self, key: &str) -> Result<Option<Vec<Identifier>>, CacheError> {
        let bytes = match self.store.read(key)? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };

        match serde_json::from_slice::<Option<Vec<Identifier>>>(&bytes) {
            Ok(entry) => Ok(entry),
            Err(e) => {
                warn!(key, error = %e, "corrupt identifier cache entry, recomputing");
                Ok(None)
            }
        }
    }
}

#[cfg(feature = "tree-sitter")]
impl<S: BlobStore> IdentifierCache<S> {
    /// Identifiers of every supported file under `import_path`.
    pub fn load_identify(
        &self,
        import_path: &std::path::Path,
        app: &crate::identify::IdentifierApp,
    ) -> Result<Vec<Identifier>, CacheError> {
        self.load_or_compute(IDENTIFY_KEY, || app.analysis_path(import_path))
    }

    /// Identifiers of an explicit file list, cached separately.
    pub fn load_test_identify(
        &self,
        files: &[std::path::PathBuf],
        app: &crate::identify::IdentifierApp,
    ) -> Result<Vec<Identifier>, CacheError> {
        self.load_or_compute(TEST_IDENTIFY_KEY, || app.analysis_files(files))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Annotation;
    use std::cell::Cell;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample() -> Vec<Identifier> {
        vec![
            Identifier {
                package: "com.example".to_string(),
                class_name: "UserService".to_string(),
                annotations: vec![Annotation::new("Component")],
                implements: vec!["com.example.IUserService".to_string()],
                extend: None,
            },
            Identifier {
                package: "com.example".to_string(),
                class_name: "IUserService".to_string(),
                ..Default::default()
            },
        ]
    }

    #[test]
    fn test_miss_computes_and_persists() {
        let cache = IdentifierCache::new(MemoryBlobStore::new());

        let result = cache.load_or_compute(IDENTIFY_KEY, || Ok(sample())).unwrap();

        assert_eq!(result, sample());
        let stored = cache.store().read(IDENTIFY_KEY).unwrap().unwrap();
        let text = String::from_utf8(stored).unwrap();
        assert!(text.starts_with("[\n\t{"));
        assert!(text.contains("\t\t\"class_name\": \"UserService\""));
    }

    #[test]
    fn test_compute_runs_once() {
        let cache = IdentifierCache::new(MemoryBlobStore::new());
        let calls = Cell::new(0);

        let first = cache
            .load_or_compute(IDENTIFY_KEY, || {
                calls.set(calls.get() + 1);
                Ok(sample())
            })
            .unwrap();
        let second = cache
            .load_or_compute(IDENTIFY_KEY, || {
                calls.set(calls.get() + 1);
                Ok(Vec::new())
            })
            .unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(first, second);
    }

    #[test]
    fn test_hit_skips_compute() {
        let store = MemoryBlobStore::new();
        store
            .write(TEST_IDENTIFY_KEY, &to_tab_indented_json(&sample()).unwrap())
            .unwrap();
        let cache = IdentifierCache::new(store);

        let result = cache
            .load_or_compute(TEST_IDENTIFY_KEY, || panic!("must not compute on a hit"))
            .unwrap();

        assert_eq!(result, sample());
    }

    #[test]
    fn test_null_payload_is_a_miss() {
        let store = MemoryBlobStore::new();
        store.write(IDENTIFY_KEY, b"null").unwrap();
        let cache = IdentifierCache::new(store);

        let result = cache.load_or_compute(IDENTIFY_KEY, || Ok(sample())).unwrap();

        assert_eq!(result, sample());
        let stored = cache.store().read(IDENTIFY_KEY).unwrap().unwrap();
        assert_ne!(stored, b"null".to_vec());
    }

    #[test]
    fn test_corrupt_payload_is_recomputed() {
        let store = MemoryBlobStore::new();
        store.write(IDENTIFY_KEY, b"[{\"class_name\": ").unwrap();
        let cache = IdentifierCache::new(store);

        let result = cache.load_or_compute(IDENTIFY_KEY, || Ok(sample())).unwrap();

        assert_eq!(result, sample());
    }

    #[test]
    fn test_keys_are_independent() {
        let cache = IdentifierCache::new(MemoryBlobStore::new());

        cache.load_or_compute(IDENTIFY_KEY, || Ok(sample())).unwrap();
        let test_scope = cache
            .load_or_compute(TEST_IDENTIFY_KEY, || Ok(Vec::new()))
            .unwrap();

        assert!(test_scope.is_empty());
    }

    #[test]
    fn test_compute_error_propagates() {
        let cache = IdentifierCache::new(MemoryBlobStore::new());

        let err = cache
            .load_or_compute(IDENTIFY_KEY, || Err(anyhow::anyhow!("walk failed")))
            .unwrap_err();

        assert!(matches!(err, CacheError::Compute(_)));
        assert!(cache.store().read(IDENTIFY_KEY).unwrap().is_none());
    }

    #[test]
    fn test_serialization_round_trip() {
        let encoded = to_tab_indented_json(&sample()).unwrap();
        let decoded: Vec<Identifier> = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn test_compute_may_load_another_key() {
        let cache = IdentifierCache::new(MemoryBlobStore::new());

        let result = cache
            .load_or_compute(IDENTIFY_KEY, || {
                let mut all = sample();
                all.extend(cache.load_or_compute(TEST_IDENTIFY_KEY, || Ok(sample()))?);
                Ok(all)
            })
            .unwrap();

        assert_eq!(result.len(), 4);
        assert!(cache.store().read(TEST_IDENTIFY_KEY).unwrap().is_some());
    }

    #[test]
    fn test_panicking_compute_leaves_cache_usable() {
        let cache = IdentifierCache::new(MemoryBlobStore::new());

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            cache.load_or_compute(IDENTIFY_KEY, || panic!("walk crashed"))
        }));
        assert!(outcome.is_err());

        let other = cache
            .load_or_compute(TEST_IDENTIFY_KEY, || Ok(Vec::new()))
            .unwrap();
        assert!(other.is_empty());

        let retried = cache.load_or_compute(IDENTIFY_KEY, || Ok(sample())).unwrap();
        assert_eq!(retried, sample());
    }

    #[test]
    fn test_concurrent_callers_compute_once() {
        let cache = IdentifierCache::new(MemoryBlobStore::new());
        let calls = AtomicUsize::new(0);

        let results: Vec<Vec<Identifier>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        cache
                            .load_or_compute(IDENTIFY_KEY, || {
                                calls.fetch_add(1, Ordering::SeqCst);
                                std::thread::sleep(std::time::Duration::from_millis(20));
                                Ok(sample())
                            })
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|r| *r == sample()));
    }
}
