//! Integration tests for the allocate/finalize cycle
//!
//! These tests drive the serializer the way the print pipeline does: allocate
//! before printing, finalize once the print resolves, and check that numbers
//! are neither lost nor reused across units.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use tempfile::TempDir;

use label_serials::app::document::{self, Document};
use label_serials::app::{
    AllocationSource, CacheConfig, CacheStore, ConflictPolicy, FinalizeAction, PrintOutcome,
    QueueStore, QueueStoreConfig, ReserveOutcome, SerializationMode, Serializer,
};
use label_serials::errors::{AppError, CacheError};

struct Workstation {
    _dir: TempDir,
    serializer: Serializer,
}

async fn create_workstation(parts: &[(&str, u64)], policy: ConflictPolicy) -> Workstation {
    let temp_dir = TempDir::new().unwrap();
    let shared = temp_dir.path().join("shared");
    tokio::fs::create_dir_all(&shared).await.unwrap();

    let document: Document = parts
        .iter()
        .map(|(part, value)| (part.to_string(), *value))
        .collect();

    let mut queues = Vec::new();
    for mode in [SerializationMode::Jbk, SerializationMode::Lot] {
        let config = QueueStoreConfig::in_directory(mode, &shared);
        document::save_atomic(&config.path, &document).await.unwrap();
        queues.push(QueueStore::new(config));
    }

    let cache_config = CacheConfig::with_cache_root(temp_dir.path().join("local"))
        .with_conflict_policy(policy);
    let cache = Arc::new(CacheStore::new(cache_config).unwrap());

    Workstation {
        _dir: temp_dir,
        serializer: Serializer::new(queues, cache),
    }
}

/// Successful full unit leaves nothing reserved
#[tokio::test]
async fn test_full_unit_round_trip_clears_cache() {
    let station = create_workstation(&[("PN-100", 7)], ConflictPolicy::Reject).await;
    let serializer = &station.serializer;

    let allocation = serializer
        .allocate("PN-100", SerializationMode::Jbk, true)
        .await
        .unwrap();
    assert_eq!(allocation.serial.as_str(), "007");

    serializer
        .finalize("PN-100", &allocation.serial, PrintOutcome::Succeeded, true)
        .await
        .unwrap();

    assert_eq!(serializer.cache().find("PN-100").await.unwrap(), None);
    assert!(!serializer.cache().document_path().exists());
}

/// A failed print gets the same serial back without drawing again
#[tokio::test]
async fn test_failed_print_reuses_serial() {
    let station = create_workstation(&[("PN-100", 7)], ConflictPolicy::Reject).await;
    let serializer = &station.serializer;

    let first = serializer
        .allocate("PN-100", SerializationMode::Jbk, true)
        .await
        .unwrap();
    let next_after_first = serializer
        .peek("PN-100", SerializationMode::Jbk)
        .await
        .unwrap();
    assert_eq!(next_after_first, 8);

    let action = serializer
        .finalize("PN-100", &first.serial, PrintOutcome::Failed, true)
        .await
        .unwrap();
    assert_eq!(action, FinalizeAction::Held(ReserveOutcome::Created));

    let retry = serializer
        .allocate("PN-100", SerializationMode::Jbk, true)
        .await
        .unwrap();
    assert_eq!(retry.serial, first.serial);
    assert_eq!(retry.source, AllocationSource::Cached);
    assert_eq!(
        serializer.peek("PN-100", SerializationMode::Jbk).await.unwrap(),
        next_after_first
    );

    serializer
        .finalize("PN-100", &retry.serial, PrintOutcome::Succeeded, true)
        .await
        .unwrap();
    let fresh = serializer
        .allocate("PN-100", SerializationMode::Jbk, true)
        .await
        .unwrap();
    assert_eq!(fresh.serial.as_str(), "008");
}

/// Partial prints of one lot share a serial until the full unit completes
#[tokio::test]
async fn test_partial_unit_persistence() {
    let station = create_workstation(&[("PN-200", 41)], ConflictPolicy::Reject).await;
    let serializer = &station.serializer;

    let mut serials = Vec::new();
    for _ in 0..3 {
        let allocation = serializer
            .allocate("PN-200", SerializationMode::Lot, false)
            .await
            .unwrap();
        serializer
            .finalize("PN-200", &allocation.serial, PrintOutcome::Succeeded, false)
            .await
            .unwrap();
        serials.push(allocation.serial);
    }
    assert!(serials.iter().all(|s| s.as_str() == "000000041"));

    let last = serializer
        .allocate("PN-200", SerializationMode::Lot, true)
        .await
        .unwrap();
    assert_eq!(last.serial.as_str(), "000000041");
    serializer
        .finalize("PN-200", &last.serial, PrintOutcome::Succeeded, true)
        .await
        .unwrap();

    let next_lot = serializer
        .allocate("PN-200", SerializationMode::Lot, false)
        .await
        .unwrap();
    assert_eq!(next_lot.serial.as_str(), "000000042");
}

/// Reservations are durable across a restart of the workstation process
#[tokio::test]
async fn test_reservation_survives_restart() {
    let station = create_workstation(&[("PN-300", 12)], ConflictPolicy::Reject).await;
    let allocation = station
        .serializer
        .allocate("PN-300", SerializationMode::Jbk, false)
        .await
        .unwrap();

    let cache_root = station.serializer.cache().cache_root().to_path_buf();
    let jbk = station
        .serializer
        .queue(SerializationMode::Jbk)
        .unwrap()
        .clone();
    let restarted = Serializer::new(
        [jbk],
        Arc::new(CacheStore::new(CacheConfig::with_cache_root(cache_root)).unwrap()),
    );

    let again = restarted
        .allocate("PN-300", SerializationMode::Jbk, false)
        .await
        .unwrap();
    assert_eq!(again.serial, allocation.serial);
    assert_eq!(again.source, AllocationSource::Cached);
}

/// Conflicting hold is rejected under the reject policy
#[tokio::test]
async fn test_conflict_policy_reject() {
    let station = create_workstation(&[("PN-400", 3)], ConflictPolicy::Reject).await;
    let serializer = &station.serializer;

    serializer
        .allocate("PN-400", SerializationMode::Jbk, false)
        .await
        .unwrap();

    let stale = SerializationMode::Jbk.format(2);
    let result = serializer
        .finalize("PN-400", &stale, PrintOutcome::Failed, true)
        .await;

    assert!(matches!(
        result,
        Err(AppError::Cache(CacheError::ConflictingReservation {
            held: 3,
            requested: 2,
            ..
        }))
    ));
    assert_eq!(serializer.cache().find("PN-400").await.unwrap(), Some(3));
}

/// Conflicting hold replaces the old one under the overwrite policy
#[tokio::test]
async fn test_conflict_policy_overwrite() {
    let station = create_workstation(&[("PN-400", 3)], ConflictPolicy::Overwrite).await;
    let serializer = &station.serializer;

    serializer
        .allocate("PN-400", SerializationMode::Jbk, false)
        .await
        .unwrap();

    let stale = SerializationMode::Jbk.format(2);
    let action = serializer
        .finalize("PN-400", &stale, PrintOutcome::Failed, true)
        .await
        .unwrap();

    assert_eq!(
        action,
        FinalizeAction::Held(ReserveOutcome::Replaced { previous: 3 })
    );
    assert_eq!(serializer.cache().find("PN-400").await.unwrap(), Some(2));
}

/// Parts are tracked independently
#[tokio::test]
async fn test_parts_do_not_share_holds() {
    let station =
        create_workstation(&[("PN-A", 100), ("PN-B", 200)], ConflictPolicy::Reject).await;
    let serializer = &station.serializer;

    let a = serializer
        .allocate("PN-A", SerializationMode::Jbk, false)
        .await
        .unwrap();
    let b = serializer
        .allocate("PN-B", SerializationMode::Jbk, false)
        .await
        .unwrap();
    assert_eq!(a.serial.as_str(), "100");
    assert_eq!(b.serial.as_str(), "200");

    serializer
        .finalize("PN-A", &a.serial, PrintOutcome::Succeeded, true)
        .await
        .unwrap();

    assert_eq!(serializer.cache().find("PN-A").await.unwrap(), None);
    assert_eq!(serializer.cache().find("PN-B").await.unwrap(), Some(200));
}

/// Concurrent prints of one part never lose a drawn number
///
/// Full units each consume their own number; partial prints of the open lot
/// all see the one held number.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_allocations_for_one_part() {
    let station = create_workstation(&[("PN-500", 10)], ConflictPolicy::Reject).await;
    let serializer = Arc::new(station.serializer);

    let full_units = (0..8).map(|_| {
        let serializer = Arc::clone(&serializer);
        tokio::spawn(async move {
            serializer
                .allocate("PN-500", SerializationMode::Jbk, true)
                .await
        })
    });
    let serials: HashSet<String> = join_all(full_units)
        .await
        .into_iter()
        .map(|handle| handle.unwrap().unwrap().serial.to_string())
        .collect();

    let expected: HashSet<String> = (10..18)
        .map(|n| SerializationMode::Jbk.format(n).to_string())
        .collect();
    assert_eq!(serials, expected);
    assert_eq!(serializer.cache().find("PN-500").await.unwrap(), None);

    let partials = (0..8).map(|_| {
        let serializer = Arc::clone(&serializer);
        tokio::spawn(async move {
            serializer
                .allocate("PN-500", SerializationMode::Jbk, false)
                .await
        })
    });
    let serials: HashSet<String> = join_all(partials)
        .await
        .into_iter()
        .map(|handle| handle.unwrap().unwrap().serial.to_string())
        .collect();

    assert_eq!(serials.len(), 1);
    assert!(serials.contains("018"));
    assert_eq!(serializer.cache().find("PN-500").await.unwrap(), Some(18));
    assert_eq!(
        serializer.peek("PN-500", SerializationMode::Jbk).await.unwrap(),
        19
    );
}
