//! Contract tests run against every backend.

use proptest::prelude::*;
use recdb_core::{open, Backend, Registry, StoreConfig, StoreHandle};
use recdb_testkit::prelude::*;
use std::sync::Arc;
use std::thread;

#[test]
fn create_then_get_returns_same_content() {
    for_each_backend(|store| {
        let mut record = Record::new("alpha", Status::Active);
        store.create(&mut record).unwrap();

        let fetched = store.get_by_id(record.id).unwrap();
        assert!(fetched.same_content(&record), "{}", store.backend());
        assert_eq!(fetched.id, record.id);
    });
}

#[test]
fn never_issued_ids_are_not_found() {
    for_each_backend(|store| {
        assert_not_found(store.get_by_id(NEVER_ISSUED), NEVER_ISSUED);
        assert_not_found(
            store.update(NEVER_ISSUED, Record::new("x", Status::Active)),
            NEVER_ISSUED,
        );
        assert_not_found(store.delete(NEVER_ISSUED), NEVER_ISSUED);
    });
}

#[test]
fn assigned_id_is_rejected_on_create() {
    for_each_backend(|store| {
        let mut record = Record::new("x", Status::Active).with_id(RecordId::new(42));
        let err = store.create(&mut record).unwrap_err();
        assert!(
            matches!(err, StoreError::InvalidArgument { .. }),
            "{}: {err:?}",
            store.backend()
        );
        assert_eq!(record.id, RecordId::new(42));
    });
}

#[test]
fn ids_increase_in_creation_order() {
    for_each_backend(|store| {
        let mut a = Record::new("A", Status::Inactive);
        let mut b = Record::new("B", Status::Active);
        store.create(&mut a).unwrap();
        store.create(&mut b).unwrap();
        assert!(a.id < b.id, "{}", store.backend());

        if supports_get_all(store.backend()) {
            let mut names: Vec<_> = store.get_all().unwrap().into_iter().map(|r| r.name).collect();
            names.sort();
            assert_eq!(names, vec!["A", "B"]);
        }
    });
}

#[test]
fn update_forces_id_and_is_idempotent() {
    for_each_backend(|store| {
        let mut record = Record::new("a", Status::Inactive);
        store.create(&mut record).unwrap();

        let replacement = Record::new("b", Status::Active).with_id(RecordId::new(9_999));
        store.update(record.id, replacement.clone()).unwrap();
        let once = store.get_by_id(record.id).unwrap();
        store.update(record.id, replacement).unwrap();
        let twice = store.get_by_id(record.id).unwrap();

        assert_eq!(once, twice);
        assert_eq!(once.id, record.id);
        assert_eq!(once.name, "b");
        assert_not_found(store.get_by_id(RecordId::new(9_999)), RecordId::new(9_999));
    });
}

#[test]
fn delete_twice_reports_not_found() {
    for_each_backend(|store| {
        let mut record = Record::new("a", Status::Active);
        store.create(&mut record).unwrap();
        store.delete(record.id).unwrap();
        assert_not_found(store.delete(record.id), record.id);
        assert_not_found(store.get_by_id(record.id), record.id);
    });
}

#[test]
fn off_heap_listing_is_unsupported() {
    let store = TestStore::open(Backend::OffHeap);
    store.create(&mut Record::new("a", Status::Active)).unwrap();
    assert!(matches!(
        store.get_all(),
        Err(StoreError::Unsupported { .. })
    ));
}

#[test]
fn actor_observes_single_caller_order() {
    let store = TestStore::open(Backend::Actor);
    let mut ids = Vec::new();
    for name in ["one", "two", "three"] {
        let mut record = Record::new(name, Status::Active);
        store.create(&mut record).unwrap();
        ids.push(record.id);
    }
    store.update(ids[0], Record::new("uno", Status::Inactive)).unwrap();
    store.delete(ids[1]).unwrap();

    let names: Vec<_> = store.get_all().unwrap().into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["uno", "three"]);
}

#[test]
fn concurrent_callers_keep_their_own_records() {
    for backend in all_backends() {
        let store = TestStore::open(backend);
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let shared = store.shared();
                thread::spawn(move || {
                    let mut mine = Vec::new();
                    for i in 0..200 {
                        let mut record = Record::new(format!("{t}:{i}"), Status::Active);
                        shared.create(&mut record).unwrap();
                        mine.push(record);
                    }
                    for record in &mine {
                        assert_eq!(&shared.get_by_id(record.id).unwrap(), record);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
    }
}

#[test]
fn sharded_partition_request_is_rounded() {
    for (requested, realized) in [(1, 1), (3, 4), (5, 8), (8, 8), (17, 32)] {
        let store = recdb_core::ShardedStore::open(requested).unwrap();
        assert_eq!(store.partition_count(), realized);
        store.shutdown();
    }
}

#[test]
fn closed_stores_report_closed() {
    for backend in [Backend::Sharded, Backend::ShardedAffine, Backend::Actor] {
        let handle = open(&test_config(backend)).unwrap();
        assert!(handle.close());
        assert!(
            matches!(handle.get_all(), Err(StoreError::Closed)),
            "{backend}"
        );
    }

    let handle = open(&test_config(Backend::OffHeap)).unwrap();
    handle.close();
    assert!(matches!(
        handle.get_by_id(RecordId::new(1)),
        Err(StoreError::Closed)
    ));
}

#[test]
fn registry_hands_out_one_store() {
    let registry = Registry::new();
    let handle: StoreHandle = open(&StoreConfig::new().backend(Backend::Actor)).unwrap();
    assert!(registry.init(handle));
    assert!(!registry.init(open(&test_config(Backend::LockFree)).unwrap()));

    let first = registry.get().unwrap();
    let second = registry.get().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.backend(), Backend::Actor);

    drop((first, second));
    registry.reset();
    assert!(registry.get().is_none());
}

proptest! {
    #![proptest_config(PropTestConfig::quick().to_proptest_config())]

    #[test]
    fn random_sequences_match_model(ops in operation_sequence_strategy(1, 60)) {
        for backend in all_backends() {
            let mut harness = IntegrationHarness::new(backend);
            for op in &ops {
                harness.apply(op);
            }
            harness.verify_all();
        }
    }
}
