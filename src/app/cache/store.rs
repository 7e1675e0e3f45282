//! Cache Store: local durable holds on drawn numbers
//!
//! This module contains the CacheStore implementation. The reservation
//! document is process-local, so the only contention is between tasks in
//! this process; every operation runs inside one async mutex.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::app::document::{self, Document};
use crate::constants::files;
use crate::errors::{CacheError, CacheResult};

use super::config::{CacheConfig, ConflictPolicy};
use super::reservation::{ReleaseOutcome, ReserveOutcome};

/// Reserved number per part, persisted on local storage
#[derive(Debug)]
pub struct CacheStore {
    /// Configuration
    config: CacheConfig,
    /// Cache root directory
    cache_root: PathBuf,
    /// Serializes whole-document read-modify-write cycles
    guard: Mutex<()>,
}

impl CacheStore {
    /// Create a new cache store
    ///
    /// Nothing is created on disk until the first reservation.
    ///
    /// # Errors
    ///
    /// Returns `StorageUnavailable` if no root is configured and the OS has no
    /// local data directory.
    pub fn new(config: CacheConfig) -> CacheResult<Self> {
        let cache_root = match &config.cache_root {
            Some(path) => path.clone(),
            None => Self::get_default_cache_root()?,
        };

        debug!("Reservation cache root: {}", cache_root.display());

        Ok(Self {
            config,
            cache_root,
            guard: Mutex::new(()),
        })
    }

    /// Get the cache root directory
    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// Get the cache configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Directory holding the reservation document
    pub fn reservations_dir(&self) -> PathBuf {
        self.cache_root.join(files::RESERVATIONS_DIR)
    }

    /// Reservation document path
    pub fn document_path(&self) -> PathBuf {
        self.reservations_dir().join(files::RESERVATIONS_FILE)
    }

    /// Get the default cache root for the current OS
    ///
    /// - macOS: ~/Library/Application Support/label-serials
    /// - Linux: ~/.local/share/label-serials
    /// - Windows: %LOCALAPPDATA%/label-serials
    fn get_default_cache_root() -> CacheResult<PathBuf> {
        let root = dirs::data_local_dir().ok_or_else(|| CacheError::StorageUnavailable {
            path: PathBuf::from("local data directory"),
            source: io::Error::new(
                io::ErrorKind::NotFound,
                "could not determine local data directory",
            ),
        })?;

        Ok(root.join(files::APP_DIR_NAME))
    }

    /// Number reserved for `part`, if any
    ///
    /// A missing reservation document means nothing is reserved.
    pub async fn find(&self, part: &str) -> CacheResult<Option<u64>> {
        let _guard = self.guard.lock().await;
        let document = self.load_document().await?;
        Ok(document.and_then(|d| d.get(part).copied()))
    }

    /// Hold `value` for `part`
    ///
    /// Re-reserving the held value is a no-op. Reserving a different value is
    /// governed by the configured [`ConflictPolicy`].
    ///
    /// # Errors
    ///
    /// `ConflictingReservation` under [`ConflictPolicy::Reject`] when another
    /// number is held; `StorageUnavailable` or `Corrupted` on storage failure.
    pub async fn reserve(&self, part: &str, value: u64) -> CacheResult<ReserveOutcome> {
        let _guard = self.guard.lock().await;
        let mut document = self.load_document().await?.unwrap_or_default();

        let outcome = match document.get(part).copied() {
            None => ReserveOutcome::Created,
            Some(held) if held == value => {
                debug!("{} already holds {}", part, value);
                return Ok(ReserveOutcome::AlreadyHeld);
            }
            Some(held) => match self.config.conflict_policy {
                ConflictPolicy::Reject => {
                    warn!(
                        "Refusing to reserve {} for {}: {} is still held",
                        value, part, held
                    );
                    return Err(CacheError::ConflictingReservation {
                        part: part.to_string(),
                        held,
                        requested: value,
                    });
                }
                ConflictPolicy::Overwrite => {
                    warn!(
                        "Overwriting held number {} for {} with {}",
                        held, part, value
                    );
                    ReserveOutcome::Replaced { previous: held }
                }
            },
        };

        document.insert(part.to_string(), value);
        self.ensure_reservations_dir().await?;
        self.save_document(&document).await?;

        info!("Reserved {} for {}", value, part);
        Ok(outcome)
    }

    /// Drop the hold on `value` for `part`
    ///
    /// Only removes the reservation if the held number equals `value`, so a
    /// hold that was superseded in the meantime survives. Removing the last
    /// reservation tears down the document when `teardown_on_empty` is set.
    pub async fn release(&self, part: &str, value: u64) -> CacheResult<ReleaseOutcome> {
        let _guard = self.guard.lock().await;
        let mut document = match self.load_document().await? {
            Some(document) => document,
            None => return Ok(ReleaseOutcome::NotHeld),
        };

        match document.get(part).copied() {
            None => return Ok(ReleaseOutcome::NotHeld),
            Some(held) if held != value => {
                warn!(
                    "Not releasing {} for {}: holding {} instead",
                    value, part, held
                );
                return Ok(ReleaseOutcome::Mismatch { held });
            }
            Some(_) => {
                document.remove(part);
            }
        }

        if document.is_empty() && self.config.teardown_on_empty {
            self.teardown().await?;
        } else {
            self.save_document(&document).await?;
        }

        info!("Released {} for {}", value, part);
        Ok(ReleaseOutcome::Released)
    }

    /// Snapshot of every held reservation
    pub async fn entries(&self) -> CacheResult<Document> {
        let _guard = self.guard.lock().await;
        Ok(self.load_document().await?.unwrap_or_default())
    }

    async fn load_document(&self) -> CacheResult<Option<Document>> {
        let path = self.document_path();
        document::load(&path)
            .await
            .map_err(|e| self.storage_error(&path, e))
    }

    async fn save_document(&self, document: &Document) -> CacheResult<()> {
        let path = self.document_path();
        document::save_atomic(&path, document)
            .await
            .map_err(|e| self.storage_error(&path, e))
    }

    async fn ensure_reservations_dir(&self) -> CacheResult<()> {
        let dir = self.reservations_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir)
                .await
                .map_err(|e| CacheError::StorageUnavailable {
                    path: dir.clone(),
                    source: e,
                })?;
            debug!("Created reservation directory: {}", dir.display());
        }
        Ok(())
    }

    /// Remove the empty reservation document and its directory
    async fn teardown(&self) -> CacheResult<()> {
        let path = self.document_path();
        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(self.storage_error(&path, e)),
        }

        let dir = self.reservations_dir();
        if let Err(e) = fs::remove_dir(&dir).await {
            // Stray files keep the directory; the document itself is gone
            debug!("Left reservation directory {} in place: {}", dir.display(), e);
        } else {
            debug!("Removed empty reservation directory: {}", dir.display());
        }
        Ok(())
    }

    fn storage_error(&self, path: &Path, err: io::Error) -> CacheError {
        if err.kind() == io::ErrorKind::InvalidData {
            CacheError::Corrupted {
                path: path.to_path_buf(),
                reason: err.to_string(),
            }
        } else {
            CacheError::StorageUnavailable {
                path: path.to_path_buf(),
                source: err,
            }
        }
    }
}
