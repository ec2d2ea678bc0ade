//! Shared fixtures for strata-package integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use strata_package::{
    ArtifactKind, Coordinate, Locator, MemoryStore, Repository, ResolveOptions, SignatureKind,
    StoreClient, StoreResult,
};

pub fn c(text: &str) -> Coordinate {
    text.parse().unwrap()
}

/// One `[[dependency]]` entry of a test manifest
#[derive(Debug, Clone)]
pub struct Dep {
    coordinate: Coordinate,
    scope: Option<&'static str>,
    kind: Option<&'static str>,
    exclusions: Vec<(&'static str, &'static str)>,
    omit_version: bool,
}

pub fn dep(coordinate: &str) -> Dep {
    Dep {
        coordinate: c(coordinate),
        scope: None,
        kind: None,
        exclusions: Vec::new(),
        omit_version: false,
    }
}

impl Dep {
    pub fn scope(mut self, scope: &'static str) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn kind(mut self, kind: &'static str) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn exclude(mut self, group: &'static str, artifact: &'static str) -> Self {
        self.exclusions.push((group, artifact));
        self
    }

    /// Drop the version line, producing an incomplete entry
    pub fn without_version(mut self) -> Self {
        self.omit_version = true;
        self
    }
}

/// Render a TOML manifest declaring `identity` with `deps`
pub fn manifest(identity: &str, deps: &[Dep]) -> String {
    let id = c(identity);
    let mut out = format!(
        "[project]\ngroup = \"{}\"\nartifact = \"{}\"\nversion = \"{}\"\n",
        id.group(),
        id.artifact(),
        id.version()
    );

    for dep in deps {
        let d = &dep.coordinate;
        out.push_str(&format!(
            "\n[[dependency]]\ngroup = \"{}\"\nartifact = \"{}\"\n",
            d.group(),
            d.artifact()
        ));
        if !dep.omit_version {
            out.push_str(&format!("version = \"{}\"\n", d.version()));
        }
        if let Some(classifier) = d.classifier() {
            out.push_str(&format!("classifier = \"{}\"\n", classifier));
        }
        if let Some(scope) = dep.scope {
            out.push_str(&format!("scope = \"{}\"\n", scope));
        }
        if let Some(kind) = dep.kind {
            out.push_str(&format!("type = \"{}\"\n", kind));
        }
        for (group, artifact) in &dep.exclusions {
            out.push_str(&format!(
                "\n[[dependency.exclusion]]\ngroup = \"{}\"\nartifact = \"{}\"\n",
                group, artifact
            ));
        }
    }

    out
}

/// [`MemoryStore`] wrapper that counts manifest reads and can slow them down
#[derive(Debug, Default)]
pub struct CountingStore {
    inner: MemoryStore,
    manifest_reads: AtomicUsize,
    reads_by_path: Mutex<HashMap<String, usize>>,
    delay: Mutex<Option<Duration>>,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    pub async fn put(&self, identity: &str, deps: &[Dep]) {
        self.inner
            .put_manifest(&c(identity), &manifest(identity, deps))
            .await
            .unwrap();
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn manifest_reads(&self) -> usize {
        self.manifest_reads.load(Ordering::SeqCst)
    }

    /// Manifest reads of one coordinate
    pub fn reads_of(&self, coordinate: &str) -> usize {
        let id = c(coordinate);
        let suffix = format!("/{}-{}.toml", id.artifact(), id.version());
        self.reads_by_path
            .lock()
            .unwrap()
            .iter()
            .filter(|(path, _)| path.ends_with(&suffix))
            .map(|(_, count)| *count)
            .sum()
    }

    pub fn reset(&self) {
        self.manifest_reads.store(0, Ordering::SeqCst);
        self.reads_by_path.lock().unwrap().clear();
    }
}

#[async_trait]
impl StoreClient for CountingStore {
    async fn locate(
        &self,
        coordinate: &Coordinate,
        kind: Option<&ArtifactKind>,
        signature: Option<SignatureKind>,
        create_if_absent: bool,
    ) -> StoreResult<Locator> {
        self.inner
            .locate(coordinate, kind, signature, create_if_absent)
            .await
    }

    async fn has_content(&self, locator: &Locator) -> StoreResult<bool> {
        self.inner.has_content(locator).await
    }

    async fn read(&self, locator: &Locator) -> StoreResult<Vec<u8>> {
        if locator.path().ends_with(".toml") {
            self.manifest_reads.fetch_add(1, Ordering::SeqCst);
            *self
                .reads_by_path
                .lock()
                .unwrap()
                .entry(locator.path().to_string())
                .or_default() += 1;
        }
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.read(locator).await
    }

    async fn write(&self, locator: &Locator, bytes: &[u8]) -> StoreResult<()> {
        self.inner.write(locator, bytes).await
    }
}

pub fn repository(store: &Arc<CountingStore>) -> Repository {
    Repository::new(store.clone(), ResolveOptions::default())
}
