//! Integration tests for the shared queue
//!
//! These tests exercise the queue the way several workstations would: many
//! independent store instances drawing from the same document at once.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tempfile::TempDir;

use label_serials::app::document::{self, Document};
use label_serials::app::queue::{QueueLock, QueueStore, QueueStoreConfig};
use label_serials::app::SerializationMode;
use label_serials::errors::QueueError;

async fn create_shared_queue(
    mode: SerializationMode,
    part: &str,
    start: u64,
) -> (TempDir, QueueStoreConfig) {
    let temp_dir = TempDir::new().unwrap();
    let config = QueueStoreConfig::in_directory(mode, temp_dir.path());
    let mut document = Document::new();
    document.insert(part.to_string(), start);
    document.insert("PN-OTHER".to_string(), 77);
    document::save_atomic(&config.path, &document).await.unwrap();
    (temp_dir, config)
}

/// Concurrent draws from separate store instances
///
/// Every task opens its own lock handle, so they contend on the advisory
/// lock exactly as separate processes would.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_draws_are_distinct() {
    let (_dir, config) = create_shared_queue(SerializationMode::Lot, "PN-100", 1_000).await;
    let draw_count = 32u64;

    let draws = (0..draw_count).map(|_| {
        let queue = QueueStore::new(config.clone());
        tokio::spawn(async move { queue.draw("PN-100").await })
    });

    let issued: Vec<u64> = join_all(draws)
        .await
        .into_iter()
        .map(|handle| handle.unwrap().unwrap())
        .collect();

    let unique: HashSet<u64> = issued.iter().copied().collect();
    assert_eq!(unique.len(), issued.len(), "duplicate draws: {:?}", issued);
    assert_eq!(unique, (1_000..1_000 + draw_count).collect::<HashSet<u64>>());

    let queue = QueueStore::new(config);
    assert_eq!(queue.peek("PN-100").await.unwrap(), 1_000 + draw_count);
    assert_eq!(queue.peek("PN-OTHER").await.unwrap(), 77);
}

/// Concurrent draws from separate OS threads with their own runtimes
#[test]
fn test_concurrent_draws_across_runtimes() {
    let (_dir, config) =
        tokio_test::block_on(create_shared_queue(SerializationMode::Jbk, "PN-100", 10));
    let config = Arc::new(config);

    let threads: Vec<_> = (0..4)
        .map(|_| {
            let config = Arc::clone(&config);
            std::thread::spawn(move || {
                let queue = QueueStore::new((*config).clone());
                tokio_test::block_on(async {
                    let mut issued = Vec::new();
                    for _ in 0..5 {
                        issued.push(queue.draw("PN-100").await.unwrap());
                    }
                    issued
                })
            })
        })
        .collect();

    let mut issued: Vec<u64> = threads
        .into_iter()
        .flat_map(|thread| thread.join().unwrap())
        .collect();
    issued.sort_unstable();

    assert_eq!(issued, (10..30).collect::<Vec<u64>>());
}

/// Draws are gap-free and wrap exactly once past the ceiling
#[tokio::test]
async fn test_sequence_wraps_without_gaps() {
    let (_dir, config) = create_shared_queue(SerializationMode::Jbk, "PN-100", 497).await;
    let queue = QueueStore::new(config);

    let mut issued = Vec::new();
    for _ in 0..6 {
        issued.push(queue.draw("PN-100").await.unwrap());
    }

    assert_eq!(issued, vec![497, 498, 499, 500, 0, 1]);
    assert_eq!(queue.peek("PN-100").await.unwrap(), 2);
}

/// A workstation holding the lock blocks draws until released
#[tokio::test]
async fn test_held_lock_delays_then_times_out() {
    let (_dir, config) = create_shared_queue(SerializationMode::Jbk, "PN-100", 5).await;
    let impatient =
        QueueStore::new(config.clone().with_lock_timeout(Duration::from_millis(40)));
    let patient = QueueStore::new(config.clone().with_lock_timeout(Duration::from_secs(5)));

    let held = QueueLock::acquire(&config.lock_path(), Duration::from_secs(1))
        .await
        .unwrap();

    let result = impatient.draw("PN-100").await;
    assert!(matches!(result, Err(QueueError::LockTimeout { .. })));

    let waiting = tokio::spawn(async move { patient.draw("PN-100").await });
    tokio::time::sleep(Duration::from_millis(30)).await;
    drop(held);

    assert_eq!(waiting.await.unwrap().unwrap(), 5);
    assert_eq!(impatient.peek("PN-100").await.unwrap(), 6);
}

/// Abandoned temporary files from an interrupted write don't affect draws
#[tokio::test]
async fn test_leftover_temp_file_is_ignored() {
    let (_dir, config) = create_shared_queue(SerializationMode::Lot, "PN-100", 40).await;
    tokio::fs::write(document::temp_path_for(&config.path), b"{\"PN-100\": 9")
        .await
        .unwrap();

    let queue = QueueStore::new(config);
    assert_eq!(queue.draw("PN-100").await.unwrap(), 40);
    assert_eq!(queue.peek("PN-100").await.unwrap(), 41);
}
