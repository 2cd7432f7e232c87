//! In-memory cache of per-template asset bytes.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use super::error::TemplateError;
use super::store::{TemplateHandle, TemplateStore};
use super::CACHED_ASSETS;
use crate::metrics::{TEMPLATE_CACHE_HITS, TEMPLATE_CACHE_MISSES};

/// Raw bytes of one template's fixed asset set, keyed by file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateAssetBundle {
    template_id: String,
    assets: BTreeMap<String, Vec<u8>>,
}

impl TemplateAssetBundle {
    pub fn new(template_id: impl Into<String>, assets: BTreeMap<String, Vec<u8>>) -> Self {
        Self {
            template_id: template_id.into(),
            assets,
        }
    }

    pub fn template_id(&self) -> &str {
        &self.template_id
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.assets.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.assets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Write every asset into `dir` under its own file name.
    pub async fn stage(&self, dir: &Path) -> Result<(), TemplateError> {
        for (name, data) in &self.assets {
            let path = dir.join(name);
            tokio::fs::write(&path, data)
                .await
                .map_err(|source| TemplateError::StageFailed { path, source })?;
        }
        Ok(())
    }
}

/// Process-wide template asset cache.
///
/// Entries are never evicted. When two requests populate the same id at the
/// same time both read the files, but only the first insert is kept and every
/// caller receives that entry.
pub struct TemplateAssetCache {
    store: TemplateStore,
    entries: RwLock<HashMap<String, Arc<TemplateAssetBundle>>>,
    fs_reads: AtomicU64,
}

impl TemplateAssetCache {
    pub fn new(store: TemplateStore) -> Self {
        Self {
            store,
            entries: RwLock::new(HashMap::new()),
            fs_reads: AtomicU64::new(0),
        }
    }

    pub fn store(&self) -> &TemplateStore {
        &self.store
    }

    /// Get the asset bundle for a template, loading it on first use.
    pub async fn get(&self, template_id: &str) -> Result<Arc<TemplateAssetBundle>, TemplateError> {
        if let Some(bundle) = self.entries.read().await.get(template_id) {
            TEMPLATE_CACHE_HITS.inc();
            return Ok(Arc::clone(bundle));
        }

        TEMPLATE_CACHE_MISSES.inc();
        self.fs_reads.fetch_add(1, Ordering::Relaxed);
        let handle = self.store.resolve(template_id).await?;
        let bundle = self.load(&handle).await?;

        let mut entries = self.entries.write().await;
        let entry = entries
            .entry(template_id.to_string())
            .or_insert_with(|| {
                info!(
                    template_id = %template_id,
                    assets = bundle.len(),
                    "Cached template assets"
                );
                Arc::new(bundle)
            });
        Ok(Arc::clone(entry))
    }

    /// Number of cached templates.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Filesystem operations performed while populating the cache.
    pub fn filesystem_reads(&self) -> u64 {
        self.fs_reads.load(Ordering::Relaxed)
    }

    async fn load(&self, handle: &TemplateHandle) -> Result<TemplateAssetBundle, TemplateError> {
        let mut assets = BTreeMap::new();
        for name in CACHED_ASSETS {
            let path = handle.dir().join(name);
            self.fs_reads.fetch_add(1, Ordering::Relaxed);
            match tokio::fs::read(&path).await {
                Ok(data) => {
                    debug!(template_id = %handle.id(), asset = name, bytes = data.len(), "Read template asset");
                    assets.insert(name.to_string(), data);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => return Err(TemplateError::AssetRead { path, source }),
            }
        }
        Ok(TemplateAssetBundle::new(handle.id(), assets))
    }
}
