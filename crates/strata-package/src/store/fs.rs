//! Directory-backed store

use super::{layout, Locator, StoreClient, StoreError, StoreResult};
use crate::artifact::{ArtifactKind, SignatureKind};
use crate::coordinate::Coordinate;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Store rooted at a local directory, laid out per [`layout`]
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub const SCHEME: &'static str = "file";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute filesystem path for a locator produced by this store
    pub fn resolve_path(&self, locator: &Locator) -> StoreResult<PathBuf> {
        if locator.scheme() != Self::SCHEME {
            return Err(StoreError::ForeignLocator(locator.clone()));
        }
        let mut path = self.root.clone();
        path.extend(locator.path().split('/').filter(|s| !s.is_empty()));
        Ok(path)
    }

    async fn ensure_root(&self) -> StoreResult<()> {
        match tokio::fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(StoreError::Unavailable(format!(
                "store root {} is not a directory",
                self.root.display()
            ))),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::Unavailable(format!(
                "store root {} does not exist",
                self.root.display()
            ))),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl StoreClient for FsStore {
    async fn locate(
        &self,
        coordinate: &Coordinate,
        kind: Option<&ArtifactKind>,
        signature: Option<SignatureKind>,
        create_if_absent: bool,
    ) -> StoreResult<Locator> {
        self.ensure_root().await?;
        let locator = Locator::new(
            Self::SCHEME,
            layout::path(coordinate, kind, signature)?,
            create_if_absent,
        );

        if create_if_absent {
            let path = self.resolve_path(&locator)?;
            let dir = if locator.is_directory() {
                Some(path.as_path())
            } else {
                path.parent()
            };
            if let Some(dir) = dir {
                tokio::fs::create_dir_all(dir).await?;
            }
        }

        Ok(locator)
    }

    async fn has_content(&self, locator: &Locator) -> StoreResult<bool> {
        self.ensure_root().await?;
        let path = self.resolve_path(locator)?;

        if locator.is_directory() {
            let mut entries = match tokio::fs::read_dir(&path).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
                Err(e) => return Err(e.into()),
            };
            return Ok(entries.next_entry().await?.is_some());
        }

        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn read(&self, locator: &Locator) -> StoreResult<Vec<u8>> {
        self.ensure_root().await?;
        let path = self.resolve_path(locator)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(locator.clone())),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, locator: &Locator, bytes: &[u8]) -> StoreResult<()> {
        self.ensure_root().await?;
        if !locator.is_writable() || locator.is_directory() {
            return Err(StoreError::ReadOnlyLocator(locator.clone()));
        }
        let path = self.resolve_path(locator)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Readers never observe a half-written artifact
        let mut partial = path.clone().into_os_string();
        partial.push(".part");
        let partial = PathBuf::from(partial);
        tokio::fs::write(&partial, bytes).await?;
        tokio::fs::rename(&partial, &path).await?;

        tracing::debug!(locator = %locator, size = bytes.len(), "wrote artifact");
        Ok(())
    }
}
