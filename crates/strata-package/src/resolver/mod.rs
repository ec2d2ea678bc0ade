//! Transitive dependency resolution
//!
//! Breadth-first traversal from the requested roots. Admission decisions
//! (nearest-wins, exclusions) are made one level at a time in queue order;
//! the manifests of a level's admitted entries are then fetched concurrently
//! and their dependencies enqueued in declaration order. The result is the
//! same as a single FIFO queue would produce.

pub mod conflict;

pub use conflict::{Conflict, OmittedVersion};

use crate::artifact::ArtifactKind;
use crate::coordinate::{ArtifactKey, Coordinate, Identity};
use crate::dependency::{Scope, ScopeSet};
use crate::manifest::{self, Manifest, ManifestDecoder, ManifestError};
use crate::store::{StoreClient, StoreError};
use conflict::ConflictLog;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Store unavailable while resolving {coordinate}: {source}")]
    StoreUnavailable {
        coordinate: Coordinate,
        #[source]
        source: StoreError,
    },

    #[error("Resolution failed for {} coordinate(s): {}", failures.len(), summarize(failures))]
    Unresolved {
        failures: Vec<BranchFailure>,
        partial: Resolution,
    },
}

impl ResolveError {
    /// Per-branch failures, empty unless the run completed with unresolved branches
    pub fn failures(&self) -> &[BranchFailure] {
        match self {
            ResolveError::Unresolved { failures, .. } => failures,
            _ => &[],
        }
    }
}

fn summarize(failures: &[BranchFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Why one branch of the graph could not be expanded
#[derive(Debug, Error)]
pub enum BranchFailureReason {
    #[error("manifest unreachable: {0}")]
    Unreachable(#[source] StoreError),

    #[error("cannot map to a store location: {0}")]
    InvalidCoordinate(String),

    #[error("manifest declares {declared}")]
    IdentityMismatch {
        requested: Coordinate,
        declared: Coordinate,
    },

    #[error("{0}")]
    Malformed(#[source] ManifestError),
}

impl From<StoreError> for BranchFailureReason {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::InvalidCoordinate(reason) => BranchFailureReason::InvalidCoordinate(reason),
            other => BranchFailureReason::Unreachable(other),
        }
    }
}

impl From<ManifestError> for BranchFailureReason {
    fn from(error: ManifestError) -> Self {
        match error {
            ManifestError::IdentityMismatch {
                requested,
                declared,
            } => BranchFailureReason::IdentityMismatch {
                requested,
                declared,
            },
            other => BranchFailureReason::Malformed(other),
        }
    }
}

/// A coordinate whose manifest could not be fetched or parsed
#[derive(Debug)]
pub struct BranchFailure {
    pub coordinate: Coordinate,
    pub reason: BranchFailureReason,
}

impl fmt::Display for BranchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.coordinate, self.reason)
    }
}

/// Knobs for a resolution run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Dependency scopes followed past the roots
    pub scopes: ScopeSet,
    /// Upper bound on manifest fetches in flight within one level
    pub max_concurrent_fetches: usize,
}

impl ResolveOptions {
    pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 8;

    pub fn with_scopes(mut self, scopes: ScopeSet) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn with_max_concurrent_fetches(mut self, max: usize) -> Self {
        self.max_concurrent_fetches = max.max(1);
        self
    }
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            scopes: Scope::runtime_scopes(),
            max_concurrent_fetches: Self::DEFAULT_MAX_CONCURRENT_FETCHES,
        }
    }
}

/// A coordinate that survived resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedEntry {
    pub coordinate: Coordinate,
    /// Distance from the nearest root; roots are depth 0
    pub depth: usize,
    pub kind: ArtifactKind,
    /// The entry whose manifest declared this one; `None` for roots
    pub parent: Option<Coordinate>,
}

/// Outcome of a resolution run, in classpath order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub entries: Vec<ResolvedEntry>,
    pub conflicts: Vec<Conflict>,
}

impl Resolution {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedEntry> {
        self.entries.iter()
    }

    pub fn coordinates(&self) -> impl Iterator<Item = &Coordinate> {
        self.entries.iter().map(|e| &e.coordinate)
    }

    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        self.entries.iter().any(|e| &e.coordinate == coordinate)
    }

    /// The selected entry for a logical package, if any
    pub fn get(&self, identity: &Identity) -> Option<&ResolvedEntry> {
        self.entries
            .iter()
            .find(|e| e.coordinate.identity() == *identity)
    }
}

impl<'a> IntoIterator for &'a Resolution {
    type Item = &'a ResolvedEntry;
    type IntoIter = std::slice::Iter<'a, ResolvedEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// One queued occurrence of a coordinate
#[derive(Debug, Clone)]
struct Pending {
    coordinate: Coordinate,
    depth: usize,
    kind: ArtifactKind,
    parent: Option<Coordinate>,
    /// Exclusions accumulated along the path; they apply to this item
    inherited: Arc<BTreeSet<ArtifactKey>>,
    /// Exclusions declared on this dependency; they apply only below it
    declared: BTreeSet<ArtifactKey>,
}

/// Drives manifest fetches through a [`StoreClient`] to build the closure of a root set.
///
/// Holds no state between runs.
#[derive(Clone)]
pub struct Resolver {
    store: Arc<dyn StoreClient>,
    decoder: Arc<dyn ManifestDecoder>,
    options: ResolveOptions,
}

impl Resolver {
    pub fn new(
        store: Arc<dyn StoreClient>,
        decoder: Arc<dyn ManifestDecoder>,
        options: ResolveOptions,
    ) -> Self {
        Self {
            store,
            decoder,
            options,
        }
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Resolve the transitive closure of `roots`
    pub async fn resolve(&self, roots: &[Coordinate]) -> Result<Resolution, ResolveError> {
        if roots.is_empty() {
            return Err(ResolveError::InvalidArgument(
                "at least one root coordinate is required".to_string(),
            ));
        }

        let no_exclusions = Arc::new(BTreeSet::new());
        let mut seen_roots = BTreeSet::new();
        let mut level: Vec<Pending> = roots
            .iter()
            .filter(|root| seen_roots.insert(*root))
            .map(|root| Pending {
                coordinate: root.clone(),
                depth: 0,
                kind: ArtifactKind::default(),
                parent: None,
                inherited: Arc::clone(&no_exclusions),
                declared: BTreeSet::new(),
            })
            .collect();

        let mut entries: Vec<ResolvedEntry> = Vec::new();
        let mut selected: HashMap<Identity, usize> = HashMap::new();
        let mut conflicts = ConflictLog::default();
        let mut failures = Vec::new();

        while !level.is_empty() {
            let mut admitted = Vec::with_capacity(level.len());

            for item in level {
                let identity = item.coordinate.identity();

                // BFS depths never decrease, so an existing entry is always at least as near
                if let Some(&index) = selected.get(&identity) {
                    let winner = &entries[index];
                    conflicts.record(
                        &winner.coordinate,
                        winner.depth,
                        &item.coordinate,
                        item.depth,
                        item.parent.as_ref(),
                    );
                    tracing::trace!(
                        coordinate = %item.coordinate,
                        selected = %winner.coordinate,
                        "skipping already selected identity"
                    );
                    continue;
                }

                if item.inherited.contains(&item.coordinate.artifact_key()) {
                    tracing::debug!(
                        coordinate = %item.coordinate,
                        depth = item.depth,
                        "skipping excluded dependency"
                    );
                    continue;
                }

                tracing::debug!(coordinate = %item.coordinate, depth = item.depth, "admitted");
                selected.insert(identity, entries.len());
                entries.push(ResolvedEntry {
                    coordinate: item.coordinate.clone(),
                    depth: item.depth,
                    kind: item.kind.clone(),
                    parent: item.parent.clone(),
                });
                admitted.push(item);
            }

            let coordinates: Vec<Coordinate> =
                admitted.iter().map(|item| item.coordinate.clone()).collect();
            let fetched: Vec<_> = stream::iter(coordinates)
                .map(|coordinate| async move { self.fetch_manifest(&coordinate).await })
                .buffered(self.options.max_concurrent_fetches.max(1))
                .collect()
                .await;

            let mut next = Vec::new();
            for (item, result) in admitted.into_iter().zip(fetched) {
                let manifest = match result {
                    Ok(manifest) => manifest,
                    Err(BranchFailureReason::Unreachable(StoreError::Unavailable(reason))) => {
                        return Err(ResolveError::StoreUnavailable {
                            coordinate: item.coordinate,
                            source: StoreError::Unavailable(reason),
                        });
                    }
                    Err(reason) => {
                        tracing::warn!(
                            coordinate = %item.coordinate,
                            error = %reason,
                            "failed to expand dependency"
                        );
                        failures.push(BranchFailure {
                            coordinate: item.coordinate,
                            reason,
                        });
                        continue;
                    }
                };

                let below = if item.declared.is_empty() {
                    Arc::clone(&item.inherited)
                } else {
                    let mut merged = (*item.inherited).clone();
                    merged.extend(item.declared.iter().cloned());
                    Arc::new(merged)
                };

                for dependency in manifest.dependencies {
                    if !self.options.scopes.contains(dependency.scope) {
                        tracing::trace!(
                            coordinate = %dependency.coordinate,
                            scope = %dependency.scope,
                            "skipping dependency outside configured scopes"
                        );
                        continue;
                    }

                    next.push(Pending {
                        coordinate: dependency.coordinate,
                        depth: item.depth + 1,
                        kind: dependency.kind,
                        parent: Some(item.coordinate.clone()),
                        inherited: Arc::clone(&below),
                        declared: dependency.exclusions,
                    });
                }
            }

            level = next;
        }

        let resolution = Resolution {
            entries,
            conflicts: conflicts.into_conflicts(),
        };

        if !failures.is_empty() {
            return Err(ResolveError::Unresolved {
                failures,
                partial: resolution,
            });
        }

        tracing::info!(
            roots = roots.len(),
            entries = resolution.len(),
            conflicts = resolution.conflicts.len(),
            "resolution complete"
        );
        Ok(resolution)
    }

    /// Fetch and parse the manifest describing `coordinate`
    pub async fn fetch_manifest(
        &self,
        coordinate: &Coordinate,
    ) -> Result<Manifest, BranchFailureReason> {
        let manifest_coordinate = coordinate.manifest_coordinate();
        let locator = self
            .store
            .locate(&manifest_coordinate, Some(&ArtifactKind::Manifest), None, false)
            .await?;
        let bytes = self.store.read(&locator).await?;
        let root = self.decoder.decode(&bytes)?;
        Ok(manifest::parse(&manifest_coordinate, &root)?)
    }
}
