//! Resolution cache keyed by root set
//!
//! Each key owns a slot holding a [`OnceCell`] with the outcome of one run.
//! Every caller for a key shares that slot, so only one resolution per key
//! is ever in flight and late arrivals wait on the same cell. Successful
//! entries are replaced wholesale, never patched. Failed runs are shared
//! with their waiters and then evicted. Invalidation drops slots from the
//! map; a run that finishes after its slot was dropped is returned to its
//! callers but is no longer reachable from the cache.

use crate::classpath::Classpath;
use crate::coordinate::Coordinate;
use crate::resolver::Resolution;
use crate::PackageError;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Order-independent key for a set of root coordinates
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RootKey(Vec<Coordinate>);

impl RootKey {
    pub fn new(roots: &[Coordinate]) -> Self {
        let mut roots = roots.to_vec();
        roots.sort();
        roots.dedup();
        Self(roots)
    }

    /// Roots in canonical order
    pub fn roots(&self) -> &[Coordinate] {
        &self.0
    }
}

impl fmt::Display for RootKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, root) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", root)?;
        }
        Ok(())
    }
}

/// A completed resolution together with its assembled classpath
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CachedResolution {
    pub key: RootKey,
    pub resolution: Resolution,
    pub classpath: Classpath,
    pub resolved_at: DateTime<Utc>,
}

impl CachedResolution {
    /// Whether a change to `coordinate`'s manifest could affect this entry
    pub fn depends_on(&self, coordinate: &Coordinate) -> bool {
        let changed = coordinate.manifest_coordinate();
        self.resolution
            .coordinates()
            .any(|c| c.manifest_coordinate() == changed)
    }
}

/// Outcome of one run, shared by every caller that waited on it
type Outcome<E> = Result<Arc<CachedResolution>, Arc<E>>;

#[derive(Debug)]
struct Slot<E> {
    cell: OnceCell<Outcome<E>>,
}

impl<E> Slot<E> {
    fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    fn completed(&self) -> Option<&Arc<CachedResolution>> {
        match self.cell.get() {
            Some(Ok(cached)) => Some(cached),
            _ => None,
        }
    }
}

/// Point-in-time cache counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    /// Requests answered without starting a resolution
    pub hits: u64,
    /// Requests that ran a resolution
    pub misses: u64,
    /// Keys evicted by invalidation
    pub invalidations: u64,
}

#[derive(Debug)]
pub struct ResolutionCache<E = PackageError> {
    slots: DashMap<RootKey, Arc<Slot<E>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    invalidations: AtomicU64,
}

impl<E> Default for ResolutionCache<E> {
    fn default() -> Self {
        Self {
            slots: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
        }
    }
}

impl<E> ResolutionCache<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached resolution for `roots`, running `resolve` on a miss.
    ///
    /// Concurrent callers for the same root set share one run and receive
    /// its outcome, failures included. A failed run is evicted once it has
    /// been handed out, so the next caller starts afresh. If the caller
    /// running `resolve` is cancelled, a waiting caller takes over the run.
    pub async fn get_or_resolve<F, Fut>(
        &self,
        roots: &[Coordinate],
        resolve: F,
    ) -> Result<Arc<CachedResolution>, Arc<E>>
    where
        F: FnOnce(RootKey) -> Fut,
        Fut: Future<Output = Result<(Resolution, Classpath), E>>,
    {
        let key = RootKey::new(roots);
        let slot = loop {
            let slot = self
                .slots
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Slot::new()))
                .clone();

            match slot.cell.get() {
                Some(Ok(cached)) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(key = %key, "resolution cache hit");
                    return Ok(Arc::clone(cached));
                }
                // failed run not yet evicted by its callers
                Some(Err(_)) => self.evict_failed(&key, &slot),
                None => break slot,
            }
        };

        let mut ran = false;
        let outcome = slot
            .cell
            .get_or_init(|| {
                ran = true;
                let key = key.clone();
                async move {
                    match resolve(key.clone()).await {
                        Ok((resolution, classpath)) => Ok(Arc::new(CachedResolution {
                            key,
                            resolution,
                            classpath,
                            resolved_at: Utc::now(),
                        })),
                        Err(error) => Err(Arc::new(error)),
                    }
                }
            })
            .await
            .clone();

        if ran {
            self.misses.fetch_add(1, Ordering::Relaxed);
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }

        if outcome.is_err() {
            self.evict_failed(&key, &slot);
            tracing::debug!(key = %key, shared = !ran, "resolution failed");
        }
        drop(slot);
        outcome
    }

    fn evict_failed(&self, key: &RootKey, slot: &Arc<Slot<E>>) {
        self.slots
            .remove_if(key, |_, current| Arc::ptr_eq(current, slot));
    }

    /// Completed entry for `key`, if any
    pub fn get(&self, key: &RootKey) -> Option<Arc<CachedResolution>> {
        self.slots
            .get(key)
            .and_then(|slot| slot.completed().cloned())
    }

    /// Evict every entry whose resolution may include `coordinate`, plus every
    /// resolution still in flight. Returns the number of evicted keys.
    pub fn invalidate(&self, coordinate: &Coordinate) -> usize {
        let mut evicted = 0;
        self.slots.retain(|_, slot| {
            let keep = match slot.cell.get() {
                Some(Ok(cached)) => !cached.depends_on(coordinate),
                // already handed out; its callers evict it
                Some(Err(_)) => return false,
                None => false,
            };
            if !keep {
                evicted += 1;
            }
            keep
        });

        if evicted > 0 {
            self.invalidations
                .fetch_add(evicted as u64, Ordering::Relaxed);
            tracing::info!(coordinate = %coordinate, evicted, "invalidated cached resolutions");
        }
        evicted
    }

    pub fn clear(&self) {
        self.slots.clear();
    }

    /// Number of completed entries
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.completed().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ArtifactKind;
    use crate::resolver::ResolvedEntry;
    use std::sync::atomic::AtomicUsize;

    fn c(text: &str) -> Coordinate {
        text.parse().unwrap()
    }

    fn resolution(coordinates: &[&str]) -> Resolution {
        Resolution {
            entries: coordinates
                .iter()
                .map(|text| ResolvedEntry {
                    coordinate: c(text),
                    depth: 0,
                    kind: ArtifactKind::Jar,
                    parent: None,
                })
                .collect(),
            conflicts: Vec::new(),
        }
    }

    type TestCache = ResolutionCache<&'static str>;

    async fn fill(cache: &TestCache, roots: &[Coordinate], closure: &[&str]) {
        let closure = resolution(closure);
        cache
            .get_or_resolve(roots, |_| async move { Ok::<_, &'static str>((closure, Classpath::default())) })
            .await
            .unwrap();
    }

    #[test]
    fn test_root_key_is_order_independent() {
        let a = RootKey::new(&[c("g:b:1"), c("g:a:1"), c("g:b:1")]);
        let b = RootKey::new(&[c("g:a:1"), c("g:b:1")]);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "g:a:1,g:b:1");
    }

    #[tokio::test]
    async fn test_hit_does_not_rerun() {
        let cache = TestCache::new();
        let runs = AtomicUsize::new(0);

        for _ in 0..3 {
            cache
                .get_or_resolve(&[c("g:a:1")], |_| async {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, &'static str>((resolution(&["g:a:1"]), Classpath::default()))
                })
                .await
                .unwrap();
        }

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 2,
                misses: 1,
                invalidations: 0
            }
        );
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let cache = TestCache::new();
        let err = cache
            .get_or_resolve(&[c("g:a:1")], |_| async { Err::<(Resolution, Classpath), _>("boom") })
            .await
            .unwrap_err();
        assert_eq!(*err, "boom");
        assert!(cache.is_empty());
        assert!(cache.get(&RootKey::new(&[c("g:a:1")])).is_none());

        fill(&cache, &[c("g:a:1")], &["g:a:1"]).await;
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_only_dependent_entries() {
        let cache = TestCache::new();
        fill(&cache, &[c("g:a:1")], &["g:a:1", "g:b:1"]).await;
        fill(&cache, &[c("g:x:1")], &["g:x:1"]).await;

        assert_eq!(cache.invalidate(&c("g:unrelated:1")), 0);
        assert_eq!(cache.len(), 2);

        assert_eq!(cache.invalidate(&c("g:b:1")), 1);
        assert!(cache.get(&RootKey::new(&[c("g:a:1")])).is_none());
        assert!(cache.get(&RootKey::new(&[c("g:x:1")])).is_some());
        assert_eq!(cache.stats().invalidations, 1);
    }

    #[tokio::test]
    async fn test_invalidate_matches_classified_entries() {
        let cache = TestCache::new();
        fill(&cache, &[c("g:a:1")], &["g:a:1", "g:native:1:linux"]).await;
        assert_eq!(cache.invalidate(&c("g:native:1")), 1);
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = TestCache::new();
        fill(&cache, &[c("g:a:1")], &["g:a:1"]).await;
        cache.clear();
        assert!(cache.is_empty());
    }
}
