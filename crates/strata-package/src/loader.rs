//! Loadable units built from a resolved classpath
//!
//! A [`UnitLoader`] turns a classpath into whatever its host executes. The
//! resolver never depends on what a unit is; [`LoadedUnits`] only keeps one
//! unit per root set alive for as long as the cached resolution it was built
//! from is still current.

use crate::cache::{CachedResolution, RootKey};
use crate::classpath::{Classpath, ClasspathEntry};
use crate::coordinate::Coordinate;
use crate::store::{StoreClient, StoreError};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to load {coordinate}: {reason}")]
    Artifact {
        coordinate: Coordinate,
        reason: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Turns a classpath into an executable unit
#[async_trait]
pub trait UnitLoader: Send + Sync {
    type Unit: Send + Sync + 'static;

    async fn load(&self, classpath: &Classpath) -> Result<Self::Unit, LoadError>;
}

/// Artifact bytes read eagerly, in classpath order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactBundle {
    pub artifacts: Vec<(ClasspathEntry, Vec<u8>)>,
}

impl ArtifactBundle {
    /// Total size of all artifacts in bytes
    pub fn size(&self) -> usize {
        self.artifacts.iter().map(|(_, bytes)| bytes.len()).sum()
    }
}

/// Loader that reads every artifact of the classpath into memory
pub struct BundleLoader {
    store: Arc<dyn StoreClient>,
}

impl BundleLoader {
    pub fn new(store: Arc<dyn StoreClient>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl UnitLoader for BundleLoader {
    type Unit = ArtifactBundle;

    async fn load(&self, classpath: &Classpath) -> Result<ArtifactBundle, LoadError> {
        let mut artifacts = Vec::with_capacity(classpath.len());
        for entry in classpath {
            let bytes = self.store.read(&entry.locator).await.map_err(|e| match e {
                StoreError::NotFound(_) => LoadError::Artifact {
                    coordinate: entry.coordinate.clone(),
                    reason: format!("no {} artifact at {}", entry.kind, entry.locator),
                },
                other => LoadError::Store(other),
            })?;
            artifacts.push((entry.clone(), bytes));
        }
        Ok(ArtifactBundle { artifacts })
    }
}

struct UnitSlot<U> {
    source: Arc<CachedResolution>,
    cell: OnceCell<Arc<U>>,
}

/// One loaded unit per root set, rebuilt whenever the resolution behind it changes
pub struct LoadedUnits<L: UnitLoader> {
    loader: L,
    units: DashMap<RootKey, Arc<UnitSlot<L::Unit>>>,
}

impl<L: UnitLoader> LoadedUnits<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            units: DashMap::new(),
        }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Unit for `resolution`, loading it unless a unit built from this exact
    /// cached resolution already exists
    pub async fn get_or_load(
        &self,
        resolution: &Arc<CachedResolution>,
    ) -> Result<Arc<L::Unit>, LoadError> {
        let slot = {
            let mut entry = self
                .units
                .entry(resolution.key.clone())
                .or_insert_with(|| Self::slot_for(resolution));
            if !Arc::ptr_eq(&entry.source, resolution) {
                tracing::debug!(key = %resolution.key, "resolution changed, discarding loaded unit");
                *entry = Self::slot_for(resolution);
            }
            Arc::clone(&*entry)
        };

        let unit = slot
            .cell
            .get_or_try_init(|| async {
                let unit = self.loader.load(&resolution.classpath).await?;
                tracing::debug!(key = %resolution.key, entries = resolution.classpath.len(), "loaded unit");
                Ok::<_, LoadError>(Arc::new(unit))
            })
            .await?;
        Ok(Arc::clone(unit))
    }

    /// Drop the unit for `key`
    pub fn evict(&self, key: &RootKey) -> bool {
        self.units.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    fn slot_for(resolution: &Arc<CachedResolution>) -> Arc<UnitSlot<L::Unit>> {
        Arc::new(UnitSlot {
            source: Arc::clone(resolution),
            cell: OnceCell::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ArtifactKind;
    use crate::resolver::{Resolution, ResolvedEntry};
    use crate::store::MemoryStore;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLoader {
        loads: AtomicUsize,
    }

    #[async_trait]
    impl UnitLoader for CountingLoader {
        type Unit = usize;

        async fn load(&self, classpath: &Classpath) -> Result<usize, LoadError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(classpath.len())
        }
    }

    async fn cached(store: &MemoryStore, coordinate: &str) -> Arc<CachedResolution> {
        let coordinate: Coordinate = coordinate.parse().unwrap();
        let resolution = Resolution {
            entries: vec![ResolvedEntry {
                coordinate: coordinate.clone(),
                depth: 0,
                kind: ArtifactKind::Jar,
                parent: None,
            }],
            conflicts: Vec::new(),
        };
        let classpath = Classpath::assemble(store, &resolution).await.unwrap();
        Arc::new(CachedResolution {
            key: RootKey::new(&[coordinate]),
            resolution,
            classpath,
            resolved_at: Utc::now(),
        })
    }

    #[tokio::test]
    async fn test_unit_reused_while_resolution_unchanged() {
        let store = MemoryStore::new();
        let units = LoadedUnits::new(CountingLoader {
            loads: AtomicUsize::new(0),
        });

        let first = cached(&store, "g:a:1").await;
        assert_eq!(*units.get_or_load(&first).await.unwrap(), 1);
        units.get_or_load(&first).await.unwrap();
        assert_eq!(units.loader().loads.load(Ordering::SeqCst), 1);

        let replaced = cached(&store, "g:a:1").await;
        units.get_or_load(&replaced).await.unwrap();
        assert_eq!(units.loader().loads.load(Ordering::SeqCst), 2);
        assert_eq!(units.len(), 1);
    }

    #[tokio::test]
    async fn test_bundle_loader_reads_artifacts() {
        let store = Arc::new(MemoryStore::new());
        let coordinate: Coordinate = "g:a:1".parse().unwrap();
        let locator = store
            .locate(&coordinate, Some(&ArtifactKind::Jar), None, true)
            .await
            .unwrap();
        store.write(&locator, b"code").await.unwrap();

        let resolution = cached(&store, "g:a:1").await;
        let bundle = BundleLoader::new(store.clone())
            .load(&resolution.classpath)
            .await
            .unwrap();
        assert_eq!(bundle.size(), 4);
        assert_eq!(bundle.artifacts[0].1, b"code");
    }

    #[tokio::test]
    async fn test_bundle_loader_missing_artifact() {
        let store = Arc::new(MemoryStore::new());
        let resolution = cached(&store, "g:a:1").await;
        let err = BundleLoader::new(store.clone())
            .load(&resolution.classpath)
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Artifact { .. }));
    }
}
