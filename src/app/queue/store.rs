//! Queue Store: the shared per-part counter for one serialization mode
//!
//! The queue document lives on storage shared by every workstation. A draw
//! holds the [`QueueLock`] for the whole load-mutate-save cycle and publishes
//! the advanced counter with an atomic rename, so a draw is observed either
//! fully applied or not at all.

use std::future::Future;
use std::io;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::app::document::{self, Document};
use crate::app::mode::SerializationMode;
use crate::errors::{QueueError, QueueResult};

use super::config::QueueStoreConfig;
use super::lock::QueueLock;

/// Persisted next-unissued number per part for one mode
#[derive(Debug, Clone)]
pub struct QueueStore {
    config: QueueStoreConfig,
}

impl QueueStore {
    /// Create a queue store over the configured document
    pub fn new(config: QueueStoreConfig) -> Self {
        Self { config }
    }

    /// Mode this queue issues numbers for
    pub fn mode(&self) -> SerializationMode {
        self.config.mode
    }

    /// Queue document path
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Get the store configuration
    pub fn config(&self) -> &QueueStoreConfig {
        &self.config
    }

    /// Next number `part` would be issued, without advancing the counter
    ///
    /// # Errors
    ///
    /// `NotFound` if the part is not provisioned, `StorageUnavailable`,
    /// `Timeout` or `Corrupted` if the document cannot be trusted.
    pub async fn peek(&self, part: &str) -> QueueResult<u64> {
        self.bounded(async {
            let document = self.load_document().await?;
            self.lookup(&document, part)
        })
        .await
    }

    /// Issue the stored number for `part` and advance the counter
    ///
    /// Issuing the mode's ceiling resets the stored counter to zero. The
    /// advanced counter is durable before this returns.
    ///
    /// `io_timeout` bounds lock acquisition and the load. Once the new
    /// counter is decided the write runs to completion in its own task, which
    /// owns the lock, so neither a timeout nor a dropped caller can leave the
    /// counter advanced behind an error.
    ///
    /// # Errors
    ///
    /// `NotFound` if the part is not provisioned, `LockTimeout` if another
    /// workstation kept the queue locked, `Timeout` if shared storage stalled
    /// before the write, `StorageUnavailable` or `Corrupted` otherwise.
    /// `LockTimeout`, `Timeout`, `NotFound` and `Corrupted` leave the stored
    /// counter unchanged.
    pub async fn draw(&self, part: &str) -> QueueResult<u64> {
        let (lock, mut document, issued) = self
            .bounded(async {
                let lock =
                    QueueLock::acquire(&self.config.lock_path(), self.config.lock_timeout).await?;
                let document = self.load_document().await?;
                let issued = self.lookup(&document, part)?;
                Ok((lock, document, issued))
            })
            .await?;

        let next = self.config.mode.successor(issued);
        if next == 0 {
            warn!(
                "{} queue for {} reached ceiling {}, wrapping to 0",
                self.config.mode,
                part,
                self.config.mode.ceiling()
            );
        }
        document.insert(part.to_string(), next);

        let path = self.config.path.clone();
        let commit = tokio::spawn(async move {
            let result = document::save_atomic(&path, &document).await;
            drop(lock);
            result
        });

        match commit.await {
            Ok(result) => result.map_err(|e| self.storage_error(e))?,
            Err(e) => {
                return Err(self.storage_error(io::Error::new(io::ErrorKind::Other, e)));
            }
        }

        info!(
            "Drew {} number {} for {} (next {})",
            self.config.mode, issued, part, next
        );
        Ok(issued)
    }

    /// Snapshot of every provisioned part and its next number
    pub async fn entries(&self) -> QueueResult<Document> {
        self.bounded(self.load_document()).await
    }

    /// Run a queue operation under the shared storage timeout
    async fn bounded<T>(&self, operation: impl Future<Output = QueueResult<T>>) -> QueueResult<T> {
        match tokio::time::timeout(self.config.io_timeout, operation).await {
            Ok(result) => result,
            Err(_) => Err(QueueError::Timeout {
                path: self.config.path.clone(),
                waited_ms: self.config.io_timeout.as_millis() as u64,
            }),
        }
    }

    async fn load_document(&self) -> QueueResult<Document> {
        match document::load(&self.config.path).await {
            Ok(Some(document)) => {
                debug!(
                    "Loaded {} queue entries from {}",
                    document.len(),
                    self.config.path.display()
                );
                Ok(document)
            }
            Ok(None) => Err(QueueError::StorageUnavailable {
                path: self.config.path.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "queue document does not exist"),
            }),
            Err(e) => Err(self.storage_error(e)),
        }
    }

    fn lookup(&self, document: &Document, part: &str) -> QueueResult<u64> {
        let value = *document.get(part).ok_or_else(|| QueueError::NotFound {
            part: part.to_string(),
            mode: self.config.mode,
        })?;

        if value > self.config.mode.ceiling() {
            return Err(QueueError::Corrupted {
                path: self.config.path.clone(),
                reason: format!(
                    "{} is stored as {}, above the {} ceiling of {}",
                    part,
                    value,
                    self.config.mode,
                    self.config.mode.ceiling()
                ),
            });
        }

        Ok(value)
    }

    fn storage_error(&self, err: io::Error) -> QueueError {
        if err.kind() == io::ErrorKind::InvalidData {
            QueueError::Corrupted {
                path: self.config.path.clone(),
                reason: err.to_string(),
            }
        } else {
            QueueError::StorageUnavailable {
                path: self.config.path.clone(),
                source: err,
            }
        }
    }
}
