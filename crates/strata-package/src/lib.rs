//! Strata package resolution
//!
//! Transitive dependency resolution over an addressable artifact store:
//! manifest parsing, nearest-wins conflict resolution with exclusion
//! propagation, a single-flight resolution cache with targeted
//! invalidation, and classpath assembly for an external loader.

pub mod artifact;
pub mod cache;
pub mod classpath;
pub mod coordinate;
pub mod dependency;
pub mod loader;
pub mod manifest;
pub mod repository;
pub mod resolver;
pub mod store;

use std::sync::Arc;

pub use artifact::{ArtifactKind, SignatureKind};
pub use cache::{CacheStats, CachedResolution, ResolutionCache, RootKey};
pub use classpath::{Classpath, ClasspathEntry};
pub use coordinate::{ArtifactKey, Coordinate, CoordinateError, Identity};
pub use dependency::{Dependency, Scope, ScopeSet};
pub use loader::{ArtifactBundle, BundleLoader, LoadError, LoadedUnits, UnitLoader};
pub use manifest::{Element, Manifest, ManifestDecoder, ManifestError, SkippedEntry, TomlDecoder};
pub use repository::Repository;
pub use resolver::{
    BranchFailure, BranchFailureReason, Conflict, OmittedVersion, Resolution, ResolveError,
    ResolveOptions, ResolvedEntry, Resolver,
};
pub use store::{FsStore, Locator, MemoryStore, StoreClient, StoreError, StoreResult};

/// Package resolution errors
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    #[error(transparent)]
    Coordinate(#[from] CoordinateError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Load(#[from] LoadError),

    /// Failure of a cached resolution run, shared by every caller that waited on it
    #[error(transparent)]
    Shared(Arc<PackageError>),
}

impl PackageError {
    /// The underlying error, looking through [`PackageError::Shared`]
    pub fn root(&self) -> &PackageError {
        match self {
            PackageError::Shared(inner) => inner.root(),
            other => other,
        }
    }
}

impl From<BranchFailureReason> for PackageError {
    fn from(reason: BranchFailureReason) -> Self {
        match reason {
            BranchFailureReason::Unreachable(e) => PackageError::Store(e),
            BranchFailureReason::InvalidCoordinate(reason) => {
                PackageError::Store(StoreError::InvalidCoordinate(reason))
            }
            BranchFailureReason::IdentityMismatch {
                requested,
                declared,
            } => PackageError::Manifest(ManifestError::IdentityMismatch {
                requested,
                declared,
            }),
            BranchFailureReason::Malformed(e) => PackageError::Manifest(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, PackageError>;
