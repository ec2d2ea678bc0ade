mod common;

use common::{c, dep, repository, CountingStore};
use std::sync::Arc;
use std::time::Duration;
use strata_package::*;

async fn seeded() -> Arc<CountingStore> {
    let store = Arc::new(CountingStore::new());
    store.put("g:a:1", &[dep("g:b:1"), dep("g:c:1")]).await;
    store.put("g:b:1", &[dep("g:d:1")]).await;
    store.put("g:c:1", &[]).await;
    store.put("g:d:1", &[]).await;
    store.put("g:x:1", &[]).await;
    store
}

mod coherence {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_hit_issues_no_fetches() {
        let store = seeded().await;
        let repository = repository(&store);

        let first = repository.classpath(&[c("g:a:1")]).await.unwrap();
        assert_eq!(store.manifest_reads(), 4);

        let second = repository.classpath(&[c("g:a:1")]).await.unwrap();
        assert_eq!(store.manifest_reads(), 4);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_root_order_shares_entry() {
        let store = seeded().await;
        let repository = repository(&store);

        let ab = repository.classpath(&[c("g:a:1"), c("g:x:1")]).await.unwrap();
        let reads = store.manifest_reads();
        let ba = repository.classpath(&[c("g:x:1"), c("g:a:1")]).await.unwrap();

        assert!(Arc::ptr_eq(&ab, &ba));
        assert_eq!(store.manifest_reads(), reads);
    }

    #[tokio::test]
    async fn test_invalidating_member_of_closure_forces_refetch() {
        let store = seeded().await;
        let repository = repository(&store);
        repository.classpath(&[c("g:a:1")]).await.unwrap();
        store.reset();

        assert_eq!(repository.manifest_changed(&c("g:d:1")), 1);
        repository.classpath(&[c("g:a:1")]).await.unwrap();

        assert_eq!(store.manifest_reads(), 4);
        for coordinate in ["g:a:1", "g:b:1", "g:c:1", "g:d:1"] {
            assert_eq!(store.reads_of(coordinate), 1, "{}", coordinate);
        }
    }

    #[tokio::test]
    async fn test_unrelated_invalidation_keeps_entry() {
        let store = seeded().await;
        let repository = repository(&store);
        let before = repository.classpath(&[c("g:a:1")]).await.unwrap();
        store.reset();

        assert_eq!(repository.manifest_changed(&c("g:x:1")), 0);
        let after = repository.classpath(&[c("g:a:1")]).await.unwrap();

        assert_eq!(store.manifest_reads(), 0);
        assert!(Arc::ptr_eq(&before, &after));
    }

    #[tokio::test]
    async fn test_manifest_write_invalidates_and_changes_closure() {
        let store = seeded().await;
        let repository = repository(&store);
        let before = repository.classpath(&[c("g:a:1")]).await.unwrap();
        assert!(before.resolution.contains(&c("g:d:1")));

        let updated = common::manifest("g:b:1", &[dep("g:x:1")]);
        repository
            .write_artifact(&c("g:b:1"), &ArtifactKind::Manifest, updated.as_bytes())
            .await
            .unwrap();

        let after = repository.classpath(&[c("g:a:1")]).await.unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert!(after.resolution.contains(&c("g:x:1")));
        assert!(!after.resolution.contains(&c("g:d:1")));
        assert!(after.resolved_at >= before.resolved_at);
    }

    #[tokio::test]
    async fn test_failed_resolution_not_cached() {
        let store = Arc::new(CountingStore::new());
        store.put("g:a:1", &[dep("g:late:1")]).await;
        let repository = repository(&store);

        assert!(repository.classpath(&[c("g:a:1")]).await.is_err());
        assert!(repository.cache().is_empty());

        store.put("g:late:1", &[]).await;
        let cached = repository.classpath(&[c("g:a:1")]).await.unwrap();
        assert!(cached.resolution.contains(&c("g:late:1")));
    }
}

mod single_flight {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_share_one_run() {
        let store = seeded().await;
        store.set_delay(Duration::from_millis(50));
        let repository = Arc::new(repository(&store));

        let first = {
            let repository = Arc::clone(&repository);
            tokio::spawn(async move { repository.classpath(&[c("g:a:1")]).await })
        };
        let second = {
            let repository = Arc::clone(&repository);
            tokio::spawn(async move { repository.classpath(&[c("g:a:1")]).await })
        };

        let first = first.await.unwrap().unwrap();
        let second = second.await.unwrap().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.manifest_reads(), 4);
        assert_eq!(repository.cache().stats().misses, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_different_keys_resolve_independently() {
        let store = seeded().await;
        store.set_delay(Duration::from_millis(20));
        let repository = Arc::new(repository(&store));

        let a_roots = [c("g:a:1")];
        let x_roots = [c("g:x:1")];
        let (a, x) = tokio::join!(repository.classpath(&a_roots), repository.classpath(&x_roots));

        assert_eq!(a.unwrap().resolution.len(), 4);
        assert_eq!(x.unwrap().resolution.len(), 1);
        assert_eq!(repository.cache().len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_failure_shares_one_run() {
        let store = Arc::new(CountingStore::new());
        store.put("g:a:1", &[dep("g:gone:1")]).await;
        store.set_delay(Duration::from_millis(100));
        let repository = repository(&store);
        let roots = [c("g:a:1")];

        let (first, second) = tokio::join!(repository.classpath(&roots), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            repository.classpath(&roots).await
        });

        for result in [first, second] {
            let err = result.unwrap_err();
            assert!(
                matches!(
                    err.root(),
                    PackageError::Resolve(ResolveError::Unresolved { .. })
                ),
                "{:?}",
                err
            );
        }
        assert_eq!(store.manifest_reads(), 2);
        assert_eq!(repository.cache().stats().misses, 1);
        assert!(repository.cache().is_empty());

        store.put("g:gone:1", &[]).await;
        store.set_delay(Duration::from_millis(0));
        let cached = repository.classpath(&roots).await.unwrap();
        assert_eq!(cached.resolution.len(), 2);
        assert_eq!(repository.cache().stats().misses, 2);
    }

    #[test]
    fn test_classpath_future_is_send() {
        fn assert_send<T: Send>(_: &T) {}

        let store = Arc::new(CountingStore::new());
        let repository = repository(&store);
        let roots = [c("g:a:1")];
        let future = repository.classpath(&roots);
        assert_send(&future);
    }

    #[tokio::test]
    async fn test_cancelled_resolution_caches_nothing() {
        let store = seeded().await;
        store.set_delay(Duration::from_millis(200));
        let repository = repository(&store);

        let timed_out = tokio::time::timeout(
            Duration::from_millis(10),
            repository.classpath(&[c("g:a:1")]),
        )
        .await;
        assert!(timed_out.is_err());
        assert!(repository.cache().is_empty());

        store.set_delay(Duration::from_millis(0));
        let cached = repository.classpath(&[c("g:a:1")]).await.unwrap();
        assert_eq!(cached.resolution.len(), 4);
    }
}
