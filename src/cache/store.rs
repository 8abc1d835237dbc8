//! Concurrent JSON value store with optional file persistence.

use dashmap::DashMap;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

use crate::cache::{CacheError, CacheResult};
use crate::observability::metrics;

/// A thread-safe store of `storage key → JSON value`.
///
/// Cloning is cheap; every clone shares the same underlying map.
#[derive(Clone, Default)]
pub struct KvStore {
    inner: Arc<DashMap<String, Value>>,
    /// JSON file rewritten after every mutation, if any.
    persistence_path: Option<PathBuf>,
    /// Bumped after every mutation.
    generation: Arc<AtomicU64>,
    /// Serialises file writes; holds the generation last written to disk.
    persisted: Arc<Mutex<u64>>,
}

impl KvStore {
    /// Create a new empty store.
    ///
    /// # Arguments
    /// * `persistence_path` - File the store is written to after each mutation
    pub fn new(persistence_path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            persistence_path,
            generation: Arc::new(AtomicU64::new(0)),
            persisted: Arc::new(Mutex::new(0)),
        }
    }

    /// Create a store backed by `path`, loading its contents if the file exists.
    pub fn load_from_file(path: impl AsRef<Path>) -> CacheResult<Self> {
        let path = path.as_ref();
        let store = Self::new(Some(path.to_path_buf()));
        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let map: BTreeMap<String, Value> =
                serde_json::from_reader(reader).map_err(CacheError::Malformed)?;
            for (k, v) in map {
                store.inner.insert(k, v);
            }
            metrics::record_cache_size(store.inner.len());
            tracing::info!(
                path = %path.display(),
                entries = store.inner.len(),
                "Loaded cache from file"
            );
        }
        Ok(store)
    }

    /// Write the whole store to its persistence file, if one is configured.
    ///
    /// Writers are serialised and each write goes through its own temp file
    /// in the target directory before being renamed into place. A write is
    /// skipped when a concurrent writer already persisted a newer snapshot.
    pub fn save_to_file(&self) -> CacheResult<()> {
        let Some(path) = &self.persistence_path else {
            return Ok(());
        };

        let mut persisted = self.persisted.lock().unwrap_or_else(|e| e.into_inner());
        let target = self.generation.load(Ordering::SeqCst);
        if *persisted >= target && path.exists() {
            return Ok(());
        }

        let map: BTreeMap<String, Value> = self
            .inner
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();

        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, &map).map_err(|e| {
                CacheError::Serialization {
                    key: path.display().to_string(),
                    source: e,
                }
            })?;
            writer.flush()?;
        }
        tmp.persist(path).map_err(|e| e.error)?;

        *persisted = target;
        tracing::debug!(path = %path.display(), entries = map.len(), "Saved cache to file");
        Ok(())
    }

    /// Persist after a write; failures are logged, never propagated.
    fn persist(&self) {
        if let Err(e) = self.save_to_file() {
            tracing::error!(error = %e, "Failed to persist cache");
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.get(key).map(|r| r.value().clone())
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.inner.insert(key.into(), value);
        self.generation.fetch_add(1, Ordering::SeqCst);
        metrics::record_cache_size(self.inner.len());
        self.persist();
    }

    /// Remove a key. Returns whether it was present.
    pub fn delete(&self, key: &str) -> bool {
        let removed = self.inner.remove(key).is_some();
        if removed {
            self.generation.fetch_add(1, Ordering::SeqCst);
            metrics::record_cache_size(self.inner.len());
            self.persist();
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Count the entries whose storage key starts with `prefix`.
    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.inner
            .iter()
            .filter(|r| r.key().starts_with(prefix))
            .count()
    }
}

impl std::fmt::Debug for KvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvStore")
            .field("entries", &self.inner.len())
            .field("persistence_path", &self.persistence_path)
            .finish()
    }
}
