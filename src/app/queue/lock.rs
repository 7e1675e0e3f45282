//! Cross-process lock on a queue document
//!
//! Every workstation that draws from a queue takes an exclusive OS-level
//! advisory lock (`flock` on Unix, `LockFileEx` on Windows) on a sibling
//! `.lock` file for the whole load-mutate-save cycle. The OS drops the lock if
//! the holder crashes, so a dead workstation cannot wedge the queue.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use backoff::backoff::Backoff;
use backoff::ExponentialBackoffBuilder;
use fs2::FileExt;
use tracing::{debug, error};

use crate::constants::lock;
use crate::errors::{QueueError, QueueResult};

/// Exclusive lock on a queue document, released on drop
#[derive(Debug)]
pub struct QueueLock {
    file: File,
    path: PathBuf,
}

impl QueueLock {
    /// Acquire the lock at `lock_path`, retrying with backoff until `timeout`
    ///
    /// The lock file is created if missing and never removed; deleting it
    /// while another process waits on it would split the lock in two.
    ///
    /// # Errors
    ///
    /// `LockTimeout` if the lock stayed contended for `timeout`,
    /// `StorageUnavailable` if the lock file cannot be opened or locked.
    pub async fn acquire(lock_path: &Path, timeout: Duration) -> QueueResult<Self> {
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(lock_path)
            .await
            .map_err(|e| QueueError::StorageUnavailable {
                path: lock_path.to_path_buf(),
                source: e,
            })?
            .into_std()
            .await;

        let started = Instant::now();
        let mut retry = ExponentialBackoffBuilder::new()
            .with_initial_interval(lock::INITIAL_RETRY_INTERVAL)
            .with_max_interval(lock::MAX_RETRY_INTERVAL)
            .with_max_elapsed_time(Some(timeout))
            .build();

        loop {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    debug!(
                        "Acquired queue lock {} after {:?}",
                        lock_path.display(),
                        started.elapsed()
                    );
                    return Ok(Self {
                        file,
                        path: lock_path.to_path_buf(),
                    });
                }
                Err(e) if is_contended(&e) => match retry.next_backoff() {
                    Some(delay) => {
                        debug!(
                            "Queue lock {} is held elsewhere, retrying in {:?}",
                            lock_path.display(),
                            delay
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        let waited_ms = started.elapsed().as_millis() as u64;
                        error!(
                            "Gave up on queue lock {} after {} ms",
                            lock_path.display(),
                            waited_ms
                        );
                        return Err(QueueError::LockTimeout {
                            path: lock_path.to_path_buf(),
                            waited_ms,
                        });
                    }
                },
                Err(e) => {
                    error!("Failed to lock {}: {}", lock_path.display(), e);
                    return Err(QueueError::StorageUnavailable {
                        path: lock_path.to_path_buf(),
                        source: e,
                    });
                }
            }
        }
    }

    /// Path of the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for QueueLock {
    fn drop(&mut self) {
        // Closing the handle releases the lock too; unlocking first lets us log failures
        if let Err(e) = FileExt::unlock(&self.file) {
            error!("Failed to release queue lock {}: {}", self.path.display(), e);
        } else {
            debug!("Released queue lock {}", self.path.display());
        }
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || (err.raw_os_error().is_some()
            && err.raw_os_error() == fs2::lock_contended_error().raw_os_error())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_acquire_creates_lock_file() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join("jbk_queue.json.lock");

        let lock = QueueLock::acquire(&lock_path, Duration::from_secs(1))
            .await
            .unwrap();
        assert!(lock.path().exists());
    }

    #[tokio::test]
    async fn test_contended_lock_times_out() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join("jbk_queue.json.lock");

        let _held = QueueLock::acquire(&lock_path, Duration::from_secs(1))
            .await
            .unwrap();

        let result = QueueLock::acquire(&lock_path, Duration::from_millis(50)).await;
        assert!(matches!(result, Err(QueueError::LockTimeout { .. })));
    }

    #[tokio::test]
    async fn test_lock_released_on_drop() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join("lot_queue.json.lock");

        {
            let _lock = QueueLock::acquire(&lock_path, Duration::from_secs(1))
                .await
                .unwrap();
        }

        let again = QueueLock::acquire(&lock_path, Duration::from_millis(50)).await;
        assert!(again.is_ok());
        // Lock file survives release
        assert!(lock_path.exists());
    }

    #[tokio::test]
    async fn test_waiter_gets_lock_after_release() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join("jbk_queue.json.lock");

        let held = QueueLock::acquire(&lock_path, Duration::from_secs(1))
            .await
            .unwrap();

        let waiter_path = lock_path.clone();
        let waiter = tokio::spawn(async move {
            QueueLock::acquire(&waiter_path, Duration::from_secs(5)).await
        });

        tokio::time::sleep(Duration::from_millis(30)).await;
        drop(held);

        assert!(waiter.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_missing_directory_is_storage_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join("unmounted").join("jbk.json.lock");

        let result = QueueLock::acquire(&lock_path, Duration::from_millis(50)).await;
        assert!(matches!(
            result,
            Err(QueueError::StorageUnavailable { .. })
        ));
    }
}
