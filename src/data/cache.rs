use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use lru::LruCache;

use super::model::Dataset;

// ---------------------------------------------------------------------------
// TTL memoization of loaded datasets
// ---------------------------------------------------------------------------

/// Identifies one fetch: where the data lives and which sheet of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub source: PathBuf,
    pub sheet: String,
}

impl CacheKey {
    pub fn new(source: &Path, sheet: &str) -> Self {
        Self {
            source: source.to_path_buf(),
            sheet: sheet.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct CachedDataset {
    dataset: Arc<Dataset>,
    fetched_at: Instant,
}

/// Loaded datasets, reused until `ttl` has elapsed since their fetch or
/// until explicitly invalidated. Holds at most `max_entries`; the least
/// recently used entry is evicted first. Failed loads are not cached.
#[derive(Debug)]
pub struct DatasetCache {
    ttl: Duration,
    entries: LruCache<CacheKey, CachedDataset>,
}

impl DatasetCache {
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(max_entries.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            ttl,
            entries: LruCache::new(capacity),
        }
    }

    /// Return the cached dataset for `key`, or run `load` and cache it.
    pub fn get_or_load<F>(&mut self, key: &CacheKey, load: F) -> Result<Arc<Dataset>>
    where
        F: FnOnce() -> Result<Dataset>,
    {
        self.get_or_load_at(Instant::now(), key, load)
    }

    fn get_or_load_at<F>(&mut self, now: Instant, key: &CacheKey, load: F) -> Result<Arc<Dataset>>
    where
        F: FnOnce() -> Result<Dataset>,
    {
        if let Some(entry) = self.entries.get(key) {
            if now.saturating_duration_since(entry.fetched_at) < self.ttl {
                log::debug!("cache hit for {key:?}");
                return Ok(entry.dataset.clone());
            }
            log::debug!("cache entry for {key:?} expired");
            self.entries.pop(key);
        }

        let dataset = Arc::new(load()?);
        self.entries.put(
            key.clone(),
            CachedDataset {
                dataset: dataset.clone(),
                fetched_at: now,
            },
        );
        Ok(dataset)
    }

    pub fn invalidate(&mut self, key: &CacheKey) {
        self.entries.pop(key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
