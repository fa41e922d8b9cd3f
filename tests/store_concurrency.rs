//! Store Concurrency Tests
//!
//! Cover the lock and transaction contract under real threads:
//! - A contended spare is won by exactly one pairing attempt
//! - Opposite-order pairing attempts do not deadlock (canonical lock
//!   ordering)
//! - Handle misuse surfaces as programming errors
//! - Lock waits time out as transient failures

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use uuid::Uuid;

use gaugepair::config::{EngineConfig, RetryPolicy};
use gaugepair::gauge::{
    EquipmentType, GaugeDraft, GaugeStatus, GaugeSuffix, Ownership, SpecSnapshot,
};
use gaugepair::history::MemoryHistorySink;
use gaugepair::idents::SequentialAllocator;
use gaugepair::pair::ValidationCode;
use gaugepair::service::{EngineError, PairingService};
use gaugepair::store::{CompanionRepository, PairStore, StoreError};

fn engine_with(store: Arc<PairStore>) -> (CompanionRepository, Arc<PairingService>) {
    let repo = CompanionRepository::new(store);
    let pairing = Arc::new(PairingService::new(
        repo.clone(),
        Arc::new(SequentialAllocator::new()),
        EngineConfig::default(),
    ));
    (repo, pairing)
}

fn engine() -> (CompanionRepository, Arc<PairingService>) {
    engine_with(Arc::new(PairStore::new(Arc::new(MemoryHistorySink::new()))))
}

fn thread_draft() -> GaugeDraft {
    GaugeDraft {
        equipment_type: EquipmentType::ThreadPlug,
        category: "TPG".to_string(),
        specification: SpecSnapshot::thread(".250-20", "2A", "UN", "plug"),
        status: GaugeStatus::Available,
        sealed: false,
        location: "CRIB-1".to_string(),
        ownership: Ownership::Company,
    }
}

// =============================================================================
// Racing pair attempts
// =============================================================================

/// Two concurrent pairings fighting over the same GO spare: exactly one
/// wins, the loser gets NOT_A_SPARE or not-found, and the winner's link
/// is never silently overwritten.
#[test]
fn test_contended_spare_pairs_exactly_once() {
    let (repo, pairing) = engine();
    let user = Uuid::new_v4();
    let go = pairing
        .create_spare_gauge(thread_draft(), Some(GaugeSuffix::Go), user)
        .unwrap();
    let first = pairing
        .create_spare_gauge(thread_draft(), Some(GaugeSuffix::NoGo), user)
        .unwrap();
    let second = pairing
        .create_spare_gauge(thread_draft(), Some(GaugeSuffix::NoGo), user)
        .unwrap();

    let mut handles = Vec::new();
    for candidate in [first.id, second.id] {
        let pairing = Arc::clone(&pairing);
        handles.push(thread::spawn(move || {
            pairing.pair_spare_gauges(go.id, candidate, user, "BENCH-1")
        }));
    }
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    for result in &results {
        if let Err(err) = result {
            match err {
                EngineError::Validation(v) => {
                    assert_eq!(v.code(), ValidationCode::NotASpare)
                }
                EngineError::Store(StoreError::NotFound(_)) => {}
                other => panic!("unexpected loser error: {other}"),
            }
        }
    }

    // the winner's link is intact and symmetric
    let go_row = repo.get_gauge(go.id).unwrap();
    let companion = repo.get_gauge(go_row.companion.unwrap()).unwrap();
    assert_eq!(companion.companion, Some(go.id));
    // exactly one of the candidates is still a spare
    let spares = [first.id, second.id]
        .iter()
        .filter(|id| repo.get_gauge(**id).unwrap().is_spare())
        .count();
    assert_eq!(spares, 1);
}

/// The same two spares attacked from both argument orders: canonical
/// lock ordering means no deadlock, and exactly one attempt links them.
#[test]
fn test_opposite_order_pairing_does_not_deadlock() {
    let (repo, pairing) = engine();
    let user = Uuid::new_v4();
    let go = pairing
        .create_spare_gauge(thread_draft(), Some(GaugeSuffix::Go), user)
        .unwrap();
    let no_go = pairing
        .create_spare_gauge(thread_draft(), Some(GaugeSuffix::NoGo), user)
        .unwrap();

    let forward = {
        let pairing = Arc::clone(&pairing);
        thread::spawn(move || pairing.pair_spare_gauges(go.id, no_go.id, user, "BENCH-1"))
    };
    let reverse = {
        let pairing = Arc::clone(&pairing);
        thread::spawn(move || pairing.pair_spare_gauges(no_go.id, go.id, user, "BENCH-1"))
    };

    let results = [forward.join().unwrap(), reverse.join().unwrap()];
    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);

    assert_eq!(repo.get_gauge(go.id).unwrap().companion, Some(no_go.id));
    assert_eq!(repo.get_gauge(no_go.id).unwrap().companion, Some(go.id));
}

/// Unrelated pairs can be built concurrently without interference.
#[test]
fn test_independent_sets_build_concurrently() {
    let (repo, pairing) = engine();
    let user = Uuid::new_v4();

    let mut handles = Vec::new();
    for _ in 0..4 {
        let pairing = Arc::clone(&pairing);
        handles.push(thread::spawn(move || {
            pairing.create_gauge_set(thread_draft(), thread_draft(), user)
        }));
    }
    for handle in handles {
        let (go, no_go) = handle.join().unwrap().unwrap();
        assert_eq!(repo.get_gauge(go.id).unwrap().companion, Some(no_go.id));
        assert_eq!(repo.get_gauge(no_go.id).unwrap().companion, Some(go.id));
    }
    assert_eq!(repo.store().row_count().unwrap(), 8);
}

// =============================================================================
// Lock waits and timeouts
// =============================================================================

/// A pairing blocked behind a long-held row lock surfaces the timeout as
/// exhausted retries, not a hang or a domain error.
#[test]
fn test_lock_timeout_surfaces_after_retries() {
    let store = Arc::new(PairStore::with_lock_wait(
        Arc::new(MemoryHistorySink::new()),
        Duration::from_millis(20),
    ));
    let (repo, _) = engine_with(Arc::clone(&store));
    let pairing = Arc::new(PairingService::new(
        repo.clone(),
        Arc::new(SequentialAllocator::new()),
        EngineConfig {
            retry: RetryPolicy {
                max_attempts: 2,
                base_backoff: Duration::from_millis(1),
            },
            ..EngineConfig::default()
        },
    ));
    let user = Uuid::new_v4();
    let go = pairing
        .create_spare_gauge(thread_draft(), Some(GaugeSuffix::Go), user)
        .unwrap();
    let no_go = pairing
        .create_spare_gauge(thread_draft(), Some(GaugeSuffix::NoGo), user)
        .unwrap();

    // hold the GO row hostage for the duration of the attempts
    let mut blocker = store.begin();
    blocker.lock_rows(&[go.id]).unwrap();

    let result = pairing.pair_spare_gauges(go.id, no_go.id, user, "BENCH-1");
    assert!(matches!(
        result,
        Err(EngineError::RetriesExhausted { attempts: 2, .. })
    ));

    blocker.rollback();
    // with the lock released the same call goes through
    pairing
        .pair_spare_gauges(go.id, no_go.id, user, "BENCH-1")
        .unwrap();
}

// =============================================================================
// Handle contract
// =============================================================================

/// Writing without the row lock is a programming error, not a domain
/// failure, and stages nothing.
#[test]
fn test_unlocked_write_is_programming_error() {
    let (repo, pairing) = engine();
    let user = Uuid::new_v4();
    let gauge = pairing
        .create_spare_gauge(thread_draft(), Some(GaugeSuffix::Go), user)
        .unwrap();

    let mut txn = repo.store().begin();
    let err = repo
        .update_status(gauge.id, GaugeStatus::Retired, &mut txn)
        .unwrap_err();
    assert!(err.is_programming_error());
    txn.rollback();

    assert_eq!(
        repo.get_gauge(gauge.id).unwrap().status,
        GaugeStatus::Available
    );
}

/// A committed handle refuses further work.
#[test]
fn test_closed_handle_is_rejected() {
    let (repo, pairing) = engine();
    let user = Uuid::new_v4();
    let gauge = pairing
        .create_spare_gauge(thread_draft(), Some(GaugeSuffix::Go), user)
        .unwrap();

    let mut txn = repo.store().begin();
    txn.lock_rows(&[gauge.id]).unwrap();
    repo.update_location(gauge.id, "BENCH-9", &mut txn).unwrap();
    txn.commit().unwrap();

    let err = repo
        .update_location(gauge.id, "BENCH-10", &mut txn)
        .unwrap_err();
    assert!(matches!(err, StoreError::TransactionClosed));
    assert_eq!(repo.get_gauge(gauge.id).unwrap().location, "BENCH-9");
}
