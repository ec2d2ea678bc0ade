//! Facade over a store: existence queries, dependency listings, cached
//! resolution and raw artifact access

use crate::artifact::{ArtifactKind, SignatureKind};
use crate::cache::{CachedResolution, ResolutionCache};
use crate::classpath::Classpath;
use crate::coordinate::Coordinate;
use crate::dependency::Dependency;
use crate::manifest::{ManifestDecoder, TomlDecoder};
use crate::resolver::{Resolution, ResolveError, ResolveOptions, Resolver};
use crate::store::{Locator, StoreClient};
use crate::{PackageError, Result};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::BTreeSet;
use std::sync::Arc;

pub struct Repository {
    store: Arc<dyn StoreClient>,
    resolver: Resolver,
    cache: ResolutionCache,
}

impl Repository {
    /// Repository reading TOML manifests from `store`
    pub fn new(store: Arc<dyn StoreClient>, options: ResolveOptions) -> Self {
        Self::with_decoder(store, Arc::new(TomlDecoder), options)
    }

    pub fn with_decoder(
        store: Arc<dyn StoreClient>,
        decoder: Arc<dyn ManifestDecoder>,
        options: ResolveOptions,
    ) -> Self {
        Self {
            resolver: Resolver::new(Arc::clone(&store), decoder, options),
            store,
            cache: ResolutionCache::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn StoreClient> {
        &self.store
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    pub fn options(&self) -> &ResolveOptions {
        self.resolver.options()
    }

    /// Whether anything is stored for `coordinate`
    pub async fn exists(&self, coordinate: &Coordinate) -> Result<bool> {
        Ok(self.store.exists(coordinate).await?)
    }

    /// The subset of `coordinates` with stored content; duplicates are probed once
    pub async fn exists_any(&self, coordinates: &[Coordinate]) -> Result<BTreeSet<Coordinate>> {
        let unique: BTreeSet<&Coordinate> = coordinates.iter().collect();
        let probes = stream::iter(unique).map(|coordinate| async move {
            let found = self.store.exists(coordinate).await?;
            Ok::<_, PackageError>(found.then(|| coordinate.clone()))
        });

        let found: Vec<Option<Coordinate>> = probes
            .buffer_unordered(self.options().max_concurrent_fetches.max(1))
            .try_collect()
            .await?;
        Ok(found.into_iter().flatten().collect())
    }

    /// Direct dependencies of `coordinate` within the configured scopes
    pub async fn get_dependencies(&self, coordinate: &Coordinate) -> Result<Vec<Dependency>> {
        let manifest = self.resolver.fetch_manifest(coordinate).await?;
        let scopes = self.options().scopes;
        Ok(manifest
            .dependencies
            .into_iter()
            .filter(|d| scopes.contains(d.scope))
            .collect())
    }

    /// Resolve `roots` without consulting the cache
    pub async fn resolve(&self, roots: &[Coordinate]) -> Result<Resolution> {
        Ok(self.resolver.resolve(roots).await?)
    }

    /// Resolved classpath for `roots`, served from the cache when possible
    pub async fn classpath(&self, roots: &[Coordinate]) -> Result<Arc<CachedResolution>> {
        if roots.is_empty() {
            return Err(ResolveError::InvalidArgument(
                "at least one root coordinate is required".to_string(),
            )
            .into());
        }

        self.cache
            .get_or_resolve(roots, |key| async move {
                let resolution = self.resolver.resolve(key.roots()).await?;
                let classpath = Classpath::assemble(self.store.as_ref(), &resolution).await?;
                Ok::<_, PackageError>((resolution, classpath))
            })
            .await
            .map_err(|error| Arc::try_unwrap(error).unwrap_or_else(PackageError::Shared))
    }

    /// Manifest of `coordinate` changed; drop every cached resolution it may affect
    pub fn manifest_changed(&self, coordinate: &Coordinate) -> usize {
        self.cache.invalidate(coordinate)
    }

    pub async fn locate(
        &self,
        coordinate: &Coordinate,
        kind: Option<&ArtifactKind>,
        signature: Option<SignatureKind>,
        create_if_absent: bool,
    ) -> Result<Locator> {
        Ok(self
            .store
            .locate(coordinate, kind, signature, create_if_absent)
            .await?)
    }

    pub async fn read_artifact(&self, coordinate: &Coordinate, kind: &ArtifactKind) -> Result<Vec<u8>> {
        let locator = self.locate(coordinate, Some(kind), None, false).await?;
        Ok(self.store.read(&locator).await?)
    }

    /// Store `bytes` as the `kind` artifact of `coordinate`.
    ///
    /// Writing a manifest invalidates cached resolutions that include it.
    pub async fn write_artifact(
        &self,
        coordinate: &Coordinate,
        kind: &ArtifactKind,
        bytes: &[u8],
    ) -> Result<Locator> {
        let locator = self.locate(coordinate, Some(kind), None, true).await?;
        self.store.write(&locator, bytes).await?;
        if *kind == ArtifactKind::Manifest {
            self.manifest_changed(coordinate);
        }
        Ok(locator)
    }

    /// Whether a detached signature exists next to the artifact; the signature is not verified
    pub async fn has_signature(
        &self,
        coordinate: &Coordinate,
        kind: &ArtifactKind,
        signature: SignatureKind,
    ) -> Result<bool> {
        let locator = self
            .locate(coordinate, Some(kind), Some(signature), false)
            .await?;
        Ok(self.store.has_content(&locator).await?)
    }
}
