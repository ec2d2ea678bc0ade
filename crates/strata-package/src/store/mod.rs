//! Artifact store boundary
//!
//! The resolver only talks to a store through [`StoreClient`]: it asks for a
//! [`Locator`] for a coordinate and artifact kind, probes whether the locator
//! has content, and reads or writes raw bytes through it. Connection setup,
//! credentials and storage layout belong to the implementation.

mod fs;
pub mod layout;
mod memory;

pub use fs::FsStore;
pub use memory::MemoryStore;

use crate::artifact::{ArtifactKind, SignatureKind};
use crate::coordinate::Coordinate;
use async_trait::async_trait;
use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No content at {0}")]
    NotFound(Locator),

    #[error("Cannot map to a store location: {0}")]
    InvalidCoordinate(String),

    #[error("Locator {0} was not opened for writing")]
    ReadOnlyLocator(Locator),

    #[error("Locator {0} does not belong to this store")]
    ForeignLocator(Locator),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// URL-equivalent address of one artifact (or version directory) in a store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    scheme: String,
    path: String,
    writable: bool,
}

impl Locator {
    pub fn new(scheme: impl Into<String>, path: impl Into<String>, writable: bool) -> Self {
        Self {
            scheme: scheme.into(),
            path: path.into(),
            writable,
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Store-relative path, always starting with `/`
    pub fn path(&self) -> &str {
        &self.path
    }

    /// True when the locator was created with `create_if_absent`
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// True for version-directory locators (no artifact kind)
    pub fn is_directory(&self) -> bool {
        self.path.ends_with('/')
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:/{}", self.scheme, self.path)
    }
}

impl Serialize for Locator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Access to an addressable artifact store
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Map a coordinate and artifact kind onto a locator.
    ///
    /// `kind == None` addresses the version directory. With `create_if_absent`
    /// the store prepares whatever structure is needed for a later write and
    /// returns a writable locator.
    async fn locate(
        &self,
        coordinate: &Coordinate,
        kind: Option<&ArtifactKind>,
        signature: Option<SignatureKind>,
        create_if_absent: bool,
    ) -> StoreResult<Locator>;

    /// Whether the locator already has content; for directories, whether
    /// anything is stored beneath it
    async fn has_content(&self, locator: &Locator) -> StoreResult<bool>;

    async fn read(&self, locator: &Locator) -> StoreResult<Vec<u8>>;

    async fn write(&self, locator: &Locator, bytes: &[u8]) -> StoreResult<()>;

    /// Whether anything is stored for the coordinate
    async fn exists(&self, coordinate: &Coordinate) -> StoreResult<bool> {
        let locator = self.locate(coordinate, None, None, false).await?;
        self.has_content(&locator).await
    }
}
