use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::config::SourceConfig;
use crate::models::category::{CategoryMeta, CategoryStore};
use crate::source::{self, ItemSource, LoadError};

/// A fully loaded catalog. Never mutated once built.
#[derive(Debug)]
pub struct Catalog {
    pub store: CategoryStore,
    /// One line per skipped category or record.
    pub warnings: Vec<String>,
    pub source: String,
    pub loaded_at: DateTime<Utc>,
}

/// Read every configured category from `source`. Only a source-level failure
/// is returned as an error; missing categories and bad records become warnings.
pub fn load_catalog(source: &dyn ItemSource, metas: &[CategoryMeta]) -> Result<Catalog, LoadError> {
    source.check()?;

    let mut items = HashMap::new();
    let mut warnings = Vec::new();

    for meta in metas {
        match source.load_category(&meta.id) {
            Ok(load) => {
                for skipped in load.skipped {
                    warn!("[catalog] {}", skipped);
                    warnings.push(skipped);
                }
                items.insert(meta.id.clone(), load.items);
            }
            Err(e) => {
                warn!("[catalog] {}", e);
                warnings.push(e);
            }
        }
    }

    let store = CategoryStore::build(metas, items);
    info!(
        "[catalog] Loaded {} item(s) across {} categories from {} ({} warning(s))",
        store.total_items(),
        store.len(),
        source.describe(),
        warnings.len()
    );

    Ok(Catalog {
        store,
        warnings,
        source: source.describe(),
        loaded_at: Utc::now(),
    })
}

/// Identifies one catalog load: same key, same result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub source: SourceConfig,
    pub categories: Vec<CategoryMeta>,
}

struct CachedCatalog {
    catalog: Arc<Catalog>,
    loaded: Instant,
}

/// Memoizes catalog loads by [`CacheKey`]. The lock is held across a load so
/// concurrent callers with the same key share one pass.
pub struct CatalogCache {
    entries: Mutex<HashMap<CacheKey, CachedCatalog>>,
}

impl CatalogCache {
    pub fn new() -> Self {
        CatalogCache {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Cached catalog for `key`, or the result of `load` when there is none
    /// or the entry is older than `ttl`. Failed loads are not cached.
    pub fn get_or_load<F>(
        &self,
        key: &CacheKey,
        ttl: Option<Duration>,
        load: F,
    ) -> Result<Arc<Catalog>, LoadError>
    where
        F: FnOnce() -> Result<Catalog, LoadError>,
    {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(cached) = entries.get(key) {
            let fresh = ttl.map(|ttl| cached.loaded.elapsed() < ttl).unwrap_or(true);
            if fresh {
                return Ok(Arc::clone(&cached.catalog));
            }
            info!("[catalog] Cache entry expired, reloading");
        }

        let catalog = Arc::new(load()?);
        entries.insert(
            key.clone(),
            CachedCatalog {
                catalog: Arc::clone(&catalog),
                loaded: Instant::now(),
            },
        );
        Ok(catalog)
    }

    pub fn invalidate(&self, key: &CacheKey) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key).is_some()
    }
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new()
    }
}

/// The catalog as configured for this process. Managed by Rocket.
pub struct CatalogService {
    key: CacheKey,
    cache: CatalogCache,
}

impl CatalogService {
    pub fn new(source: SourceConfig, categories: Vec<CategoryMeta>) -> Self {
        CatalogService {
            key: CacheKey { source, categories },
            cache: CatalogCache::new(),
        }
    }

    fn ttl(&self) -> Option<Duration> {
        match self.key.source.cache_ttl_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn current(&self) -> Result<Arc<Catalog>, LoadError> {
        let key = &self.key;
        self.cache.get_or_load(key, self.ttl(), || {
            let source = source::create_source(&key.source)?;
            load_catalog(source.as_ref(), &key.categories)
        })
    }

    /// Drop the cached catalog and load it again.
    pub fn reload(&self) -> Result<Arc<Catalog>, LoadError> {
        self.cache.invalidate(&self.key);
        self.current()
    }
}
