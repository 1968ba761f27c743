//! Concurrent and multi-coordinator behavior of the update protocol.

use crossync_core::{
    CoordinatorConfig, EntityId, InMemoryStore, Record, SyncCoordinator, UpdateOutcome,
    VersionCache, VersionToken,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;

fn coordinator(store: &Arc<InMemoryStore>) -> Arc<SyncCoordinator<InMemoryStore>> {
    Arc::new(SyncCoordinator::with_store(Arc::clone(store)))
}

#[test]
fn concurrent_ensure_exists_creates_one_row() {
    let store = Arc::new(InMemoryStore::new());
    let id = EntityId::new();

    // Two coordinators, as if two processes registered the same player.
    let coordinators = [coordinator(&store), coordinator(&store)];
    let handles: Vec<_> = (0..16)
        .map(|i| {
            let coordinator = Arc::clone(&coordinators[i % 2]);
            thread::spawn(move || coordinator.ensure_exists(id).unwrap())
        })
        .collect();

    let created = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|created| *created)
        .count();

    assert_eq!(created, 1);
    assert_eq!(store.table().identity_count(), 1);
    assert_eq!(store.counters().rows_inserted, 1);
}

#[test]
fn racing_first_writes_accept_exactly_one() {
    let store = Arc::new(InMemoryStore::new());
    let coordinator = coordinator(&store);
    let id = EntityId::new();

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let coordinator = Arc::clone(&coordinator);
            thread::spawn(move || {
                let record = Record::new(id, VersionToken::new(), format!("writer-{i}"));
                coordinator.submit_update(record, None).unwrap()
            })
        })
        .collect();

    let accepted = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(UpdateOutcome::is_accepted)
        .count();

    assert_eq!(accepted, 1);
    assert_eq!(store.table().record_count(), 1);
    assert_eq!(coordinator.stats().rejected, 15);
}

#[test]
fn contended_entity_keeps_cache_and_store_in_step() {
    let store = Arc::new(InMemoryStore::new());
    let coordinator = coordinator(&store);
    let id = EntityId::new();
    let accepted_versions = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let coordinator = Arc::clone(&coordinator);
            let accepted_versions = Arc::clone(&accepted_versions);
            thread::spawn(move || {
                for _ in 0..50 {
                    let expected = coordinator.cached(id).and_then(|r| r.version);
                    let version = VersionToken::new();
                    let outcome = coordinator
                        .submit_update(Record::new(id, version, "state"), expected.as_ref())
                        .unwrap();
                    if outcome.is_accepted() {
                        accepted_versions.lock().push(version);
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let accepted = accepted_versions.lock();
    let stored = coordinator.fetch(id).unwrap();
    assert!(!accepted.is_empty());
    assert_eq!(coordinator.cached(id), Some(stored.clone()));
    assert!(accepted.contains(&stored.version.unwrap()));

    let stats = coordinator.stats();
    assert_eq!(stats.accepted as usize, accepted.len());
    assert_eq!(stats.accepted + stats.rejected, 400);
    assert_eq!(store.counters().records_inserted, 1);
    assert_eq!(store.counters().records_updated as usize, accepted.len() - 1);
}

#[test]
fn independent_entities_all_progress() {
    let store = Arc::new(InMemoryStore::new());
    let coordinator = coordinator(&store);
    let ids: Vec<_> = (0..8).map(|_| EntityId::new()).collect();

    let handles: Vec<_> = ids
        .iter()
        .copied()
        .map(|id| {
            let coordinator = Arc::clone(&coordinator);
            thread::spawn(move || {
                let mut expected = None;
                for step in 0..25 {
                    let version = VersionToken::new();
                    let outcome = coordinator
                        .submit_update(Record::new(id, version, format!("{step}")), expected.as_ref())
                        .unwrap();
                    assert_eq!(outcome, UpdateOutcome::Accepted);
                    expected = Some(version);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for id in ids {
        assert_eq!(coordinator.fetch(id).unwrap().payload, b"24");
    }
    assert_eq!(coordinator.stats().rejected, 0);
}

#[test]
fn store_side_check_protects_across_coordinators() {
    let store = Arc::new(InMemoryStore::new());
    let server_a = coordinator(&store);
    let server_b = coordinator(&store);
    let id = EntityId::new();

    let v1 = VersionToken::new();
    assert!(server_a
        .submit_update(Record::new(id, v1, "from-a"), None)
        .unwrap()
        .is_accepted());

    // B never saw v1; its cache cannot detect the conflict, the store does.
    let outcome = server_b
        .submit_update(Record::new(id, VersionToken::new(), "stale-b"), None)
        .unwrap();
    assert_eq!(
        outcome,
        UpdateOutcome::Rejected {
            current_version: Some(v1)
        }
    );
    assert_eq!(server_b.fetch(id).unwrap().payload, b"from-a");

    let v3 = VersionToken::new();
    assert!(server_b
        .submit_update(Record::new(id, v3, "from-b"), Some(&v1))
        .unwrap()
        .is_accepted());

    // A still believes v1 is current.
    let outcome = server_a
        .submit_update(Record::new(id, VersionToken::new(), "stale-a"), Some(&v1))
        .unwrap();
    assert_eq!(
        outcome,
        UpdateOutcome::Rejected {
            current_version: Some(v3)
        }
    );
    assert_eq!(server_a.cached(id).unwrap().version, Some(v3));
    assert_eq!(server_a.fetch(id).unwrap().payload, b"from-b");
}

#[test]
fn unconditional_writes_only_protect_one_process() {
    let store = Arc::new(InMemoryStore::new());
    let config = CoordinatorConfig::new().conditional_writes(false);
    let server_a = SyncCoordinator::new(
        config.clone(),
        Arc::clone(&store),
        Arc::new(VersionCache::new()),
    );
    let server_b = SyncCoordinator::new(config, Arc::clone(&store), Arc::new(VersionCache::new()));
    let id = EntityId::new();

    server_a
        .submit_update(Record::new(id, VersionToken::new(), "from-a"), None)
        .unwrap();
    let outcome = server_b
        .submit_update(Record::new(id, VersionToken::new(), "from-b"), None)
        .unwrap();

    // Without the store-side check the second process overwrites the first.
    assert!(outcome.is_accepted());
    assert_eq!(server_a.fetch(id).unwrap().payload, b"from-b");
}

#[test]
fn shared_cache_is_one_view() {
    let store = Arc::new(InMemoryStore::new());
    let cache = Arc::new(VersionCache::new());
    let first = SyncCoordinator::new(
        CoordinatorConfig::default(),
        Arc::clone(&store),
        Arc::clone(&cache),
    );
    let second = SyncCoordinator::new(
        CoordinatorConfig::default(),
        Arc::clone(&store),
        Arc::clone(&cache),
    );
    let id = EntityId::new();

    let v1 = VersionToken::new();
    first
        .submit_update(Record::new(id, v1, "a"), None)
        .unwrap();
    assert_eq!(second.cached(id).unwrap().version, Some(v1));

    cache.clear();
    assert!(first.cached(id).is_none());
}
