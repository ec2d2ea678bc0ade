//! In-process store, used for embedding and for tests

use super::{layout, Locator, StoreClient, StoreError, StoreResult};
use crate::artifact::{ArtifactKind, SignatureKind};
use crate::coordinate::Coordinate;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// Store that keeps every artifact in memory, keyed by layout path
#[derive(Debug)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
    available: AtomicBool,
}

impl MemoryStore {
    pub const SCHEME: &'static str = "mem";

    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Toggle availability; while unavailable every operation fails with
    /// [`StoreError::Unavailable`]
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Store a manifest for `coordinate` without going through a locator
    pub async fn put_manifest(&self, coordinate: &Coordinate, content: &str) -> StoreResult<()> {
        let path = layout::path(coordinate, Some(&ArtifactKind::Manifest), None)?;
        self.entries
            .write()
            .await
            .insert(path, content.as_bytes().to_vec());
        Ok(())
    }

    /// Remove whatever is stored at `locator`; returns whether anything was removed
    pub async fn remove(&self, locator: &Locator) -> StoreResult<bool> {
        self.check(locator)?;
        Ok(self.entries.write().await.remove(locator.path()).is_some())
    }

    /// Number of stored artifacts
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn ensure_available(&self) -> StoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store is offline".to_string()))
        }
    }

    fn check(&self, locator: &Locator) -> StoreResult<()> {
        self.ensure_available()?;
        if locator.scheme() != Self::SCHEME {
            return Err(StoreError::ForeignLocator(locator.clone()));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn locate(
        &self,
        coordinate: &Coordinate,
        kind: Option<&ArtifactKind>,
        signature: Option<SignatureKind>,
        create_if_absent: bool,
    ) -> StoreResult<Locator> {
        self.ensure_available()?;
        let path = layout::path(coordinate, kind, signature)?;
        Ok(Locator::new(Self::SCHEME, path, create_if_absent))
    }

    async fn has_content(&self, locator: &Locator) -> StoreResult<bool> {
        self.check(locator)?;
        let entries = self.entries.read().await;
        if locator.is_directory() {
            Ok(entries
                .range(locator.path().to_string()..)
                .next()
                .is_some_and(|(path, _)| path.starts_with(locator.path())))
        } else {
            Ok(entries.contains_key(locator.path()))
        }
    }

    async fn read(&self, locator: &Locator) -> StoreResult<Vec<u8>> {
        self.check(locator)?;
        self.entries
            .read()
            .await
            .get(locator.path())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(locator.clone()))
    }

    async fn write(&self, locator: &Locator, bytes: &[u8]) -> StoreResult<()> {
        self.check(locator)?;
        if !locator.is_writable() || locator.is_directory() {
            return Err(StoreError::ReadOnlyLocator(locator.clone()));
        }
        self.entries
            .write()
            .await
            .insert(locator.path().to_string(), bytes.to_vec());
        Ok(())
    }
}
