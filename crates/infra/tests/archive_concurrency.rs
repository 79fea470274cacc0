//! Racing writers on one warehouse.
//!
//! Interleavings are non-deterministic, so every scenario runs many rounds and
//! asserts the set of acceptable outcomes rather than a single final state.

use std::sync::{Arc, Barrier};
use std::thread;

use fulfilment_core::{AggregateRoot, BusinessUnitCode, Location, SystemClock, Version};
use fulfilment_infra::InMemoryWarehouseStore;
use fulfilment_warehouses::{
    ArchiveWarehouseUseCase, NewWarehouse, RegisterWarehouseUseCase, StoreError, UpdateStockUseCase,
    Warehouse, WarehouseError, WarehouseSnapshot, WarehouseStore,
};

const ROUNDS: usize = 200;

fn code(raw: &str) -> BusinessUnitCode {
    BusinessUnitCode::parse(raw).unwrap()
}

fn seeded_store(raw: &str) -> Arc<InMemoryWarehouseStore> {
    let store = Arc::new(InMemoryWarehouseStore::new());
    RegisterWarehouseUseCase::new(store.clone(), SystemClock)
        .register(NewWarehouse {
            code: code(raw),
            location: Location::parse("AMSTERDAM-001").unwrap(),
            capacity: 100,
            stock: 50,
        })
        .unwrap();
    store
}

fn race_archive_and_stock(store: Arc<InMemoryWarehouseStore>, raw: &str, new_stock: u32)
    -> (Result<Warehouse, WarehouseError>, Result<Warehouse, WarehouseError>)
{
    let barrier = Arc::new(Barrier::new(2));

    let archiver = {
        let store = store.clone();
        let barrier = barrier.clone();
        let code = code(raw);
        thread::spawn(move || {
            let use_case = ArchiveWarehouseUseCase::new(store, SystemClock);
            barrier.wait();
            use_case.archive(&code)
        })
    };

    let stocker = {
        let barrier = barrier.clone();
        let code = code(raw);
        thread::spawn(move || {
            let use_case = UpdateStockUseCase::new(store);
            barrier.wait();
            use_case.set_stock(&code, new_stock)
        })
    };

    (archiver.join().unwrap(), stocker.join().unwrap())
}

#[test]
fn concurrent_archive_and_stock_update_never_lose_both() {
    for _ in 0..ROUNDS {
        let store = seeded_store("CONCURRENT-ARCHIVE-001");
        let (archive, stock) = race_archive_and_stock(store.clone(), "CONCURRENT-ARCHIVE-001", 75);

        let last = store
            .find_by_code(&code("CONCURRENT-ARCHIVE-001"))
            .unwrap()
            .unwrap();
        let archived = last.archived_at().is_some();
        let stock_updated = last.stock() == 75;
        let conflict_seen = matches!(&archive, Err(e) if e.is_conflict())
            || matches!(&stock, Err(e) if e.is_conflict());

        assert!(
            archived || stock_updated || conflict_seen,
            "nothing happened: archived_at={:?}, stock={}",
            last.archived_at(),
            last.stock()
        );
        if !conflict_seen {
            assert!(archived || stock_updated);
        }
    }
}

#[test]
fn concurrent_archive_and_stock_update_follow_whole_record_policy() {
    for _ in 0..ROUNDS {
        let store = seeded_store("W1");
        let (archive, stock) = race_archive_and_stock(store.clone(), "W1", 75);
        let last = store.find_by_code(&code("W1")).unwrap().unwrap();

        // At least one writer always commits.
        assert!(archive.is_ok() || stock.is_ok(), "both writers failed: {archive:?} / {stock:?}");

        let commits = u64::from(archive.is_ok()) + u64::from(stock.is_ok());
        assert_eq!(last.version(), Version::new(1 + commits));
        for committed in archive.iter().chain(stock.iter()) {
            assert_eq!(committed.created_at(), last.created_at());
        }

        match (&archive, &stock) {
            // Stock committed first, archive re-read after it: both land.
            (Ok(_), Ok(_)) => {
                assert!(last.is_archived());
                assert_eq!(last.stock(), 75);
            }
            // Archive won; stock either saw the archive or lost the token race.
            (Ok(_), Err(e)) => {
                assert!(
                    matches!(e, WarehouseError::AlreadyArchived(_) | WarehouseError::Conflict(_)),
                    "unexpected stock failure: {e:?}"
                );
                assert!(last.is_archived());
                assert_eq!(last.stock(), 50);
            }
            // Stock won; archive read the old token.
            (Err(e), Ok(_)) => {
                assert!(e.is_conflict(), "unexpected archive failure: {e:?}");
                assert!(!last.is_archived());
                assert_eq!(last.stock(), 75);
            }
            (Err(_), Err(_)) => unreachable!(),
        }
    }
}

#[test]
fn double_archive_race_records_exactly_one_archival() {
    const ARCHIVERS: usize = 4;

    for _ in 0..ROUNDS / 4 {
        let store = seeded_store("W1");
        let barrier = Arc::new(Barrier::new(ARCHIVERS));

        let handles: Vec<_> = (0..ARCHIVERS)
            .map(|_| {
                let store = store.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    let use_case = ArchiveWarehouseUseCase::new(store, SystemClock);
                    barrier.wait();
                    use_case.archive(&code("W1"))
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners: Vec<&Warehouse> = results.iter().filter_map(|r| r.as_ref().ok()).collect();

        assert_eq!(winners.len(), 1, "expected exactly one archival: {results:?}");
        for result in &results {
            if let Err(e) = result {
                assert!(
                    matches!(e, WarehouseError::AlreadyArchived(_) | WarehouseError::Conflict(_)),
                    "unexpected failure: {e:?}"
                );
            }
        }

        let last = store.find_by_code(&code("W1")).unwrap().unwrap();
        assert_eq!(last.archived_at(), winners[0].archived_at());
        assert_eq!(last.version(), Version::new(2));

        // The winner's row is terminal even for a writer holding the current token.
        let reactivated = Warehouse::restore(WarehouseSnapshot {
            archived_at: None,
            ..last.to_snapshot()
        })
        .unwrap();
        assert!(matches!(store.update(&reactivated), Err(StoreError::Terminal(_))));
        assert_eq!(store.find_by_code(&code("W1")).unwrap().unwrap(), last);
    }
}

#[test]
fn racing_stock_writers_keep_the_latest_commit() {
    const WRITERS: u32 = 8;

    for _ in 0..ROUNDS / 4 {
        let store = seeded_store("W1");
        let barrier = Arc::new(Barrier::new(WRITERS as usize));

        let handles: Vec<_> = (0..WRITERS)
            .map(|i| {
                let store = store.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    let use_case = UpdateStockUseCase::new(store);
                    barrier.wait();
                    use_case.set_stock(&code("W1"), i * 10)
                })
            })
            .collect();

        let committed: Vec<Warehouse> = handles
            .into_iter()
            .filter_map(|h| match h.join().unwrap() {
                Ok(w) => Some(w),
                Err(e) => {
                    assert!(e.is_conflict(), "unexpected failure: {e:?}");
                    None
                }
            })
            .collect();

        assert!(!committed.is_empty());

        let last = store.find_by_code(&code("W1")).unwrap().unwrap();
        let newest = committed.iter().max_by_key(|w| w.version()).unwrap();
        assert_eq!(last.version(), Version::new(1 + committed.len() as u64));
        assert_eq!(last.version(), newest.version());
        assert_eq!(last.stock(), newest.stock());
    }
}

#[test]
fn operations_on_different_codes_never_conflict() {
    let store = Arc::new(InMemoryWarehouseStore::new());
    let register = RegisterWarehouseUseCase::new(store.clone(), SystemClock);
    for raw in ["A", "B", "C", "D"] {
        register
            .register(NewWarehouse {
                code: code(raw),
                location: Location::parse("ZWOLLE-001").unwrap(),
                capacity: 100,
                stock: 0,
            })
            .unwrap();
    }

    let barrier = Arc::new(Barrier::new(4));
    let handles: Vec<_> = ["A", "B", "C", "D"]
        .into_iter()
        .map(|raw| {
            let store = store.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                UpdateStockUseCase::new(store.clone()).set_stock(&code(raw), 40)?;
                ArchiveWarehouseUseCase::new(store, SystemClock).archive(&code(raw))
            })
        })
        .collect();

    for handle in handles {
        let archived = handle.join().unwrap().unwrap();
        assert_eq!(archived.stock(), 40);
        assert!(archived.is_archived());
    }
}
