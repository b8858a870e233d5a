use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use super::cache::{CacheKey, DatasetCache};
use super::loader::load_file;
use super::model::Dataset;
use crate::config::SourceConfig;

// ---------------------------------------------------------------------------
// Data source: configured datasets behind a TTL cache
// ---------------------------------------------------------------------------

/// Outcome of fetching one source. A failed fetch carries an empty dataset
/// and the message to show; it never reaches the filtering core as an error.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub dataset: Arc<Dataset>,
    pub error: Option<String>,
}

/// Upper bound on datasets kept in memory across opened files and sheets.
const MAX_CACHED_DATASETS: usize = 8;

pub struct DataSource {
    cache: DatasetCache,
}

impl DataSource {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: DatasetCache::new(MAX_CACHED_DATASETS, ttl),
        }
    }

    /// Fetch `source` through the cache.
    pub fn fetch(&mut self, source: &SourceConfig) -> Fetched {
        let Some(path) = source.path.as_ref() else {
            return Fetched {
                dataset: Arc::new(Dataset::empty()),
                error: Some(format!("No hay archivo configurado para '{}'", source.sheet)),
            };
        };

        let key = CacheKey::new(path, &source.sheet);
        let result = self.cache.get_or_load(&key, || {
            load_file(path)
                .with_context(|| format!("loading '{}' from {}", source.sheet, path.display()))
        });

        match result {
            Ok(dataset) => {
                log::info!(
                    "Loaded '{}': {} rows, columns {:?}",
                    source.sheet,
                    dataset.len(),
                    dataset.columns()
                );
                Fetched { dataset, error: None }
            }
            Err(e) => {
                log::error!("Failed to load data: {e:#}");
                Fetched {
                    dataset: Arc::new(Dataset::empty()),
                    error: Some(format!("Error loading data: {e:#}")),
                }
            }
        }
    }

    /// Drop the cached copy of `source`, if any.
    pub fn invalidate(&mut self, source: &SourceConfig) {
        if let Some(path) = &source.path {
            self.cache.invalidate(&CacheKey::new(path, &source.sheet));
        }
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

/// Point a source at a user-picked file.
pub fn with_path(source: &SourceConfig, path: PathBuf) -> SourceConfig {
    SourceConfig {
        path: Some(path),
        ..source.clone()
    }
}
