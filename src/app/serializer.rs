//! Serial allocation
//!
//! The [`Serializer`] decides, for each label about to be printed, whether
//! the part already holds a reserved number to reuse or a fresh number must
//! be drawn from the shared queue. Drawing is the only path that consumes a
//! number permanently.
//!
//! Allocation and finalization of one part run one at a time within a
//! process, so two in-flight prints of the same lot never both draw.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, info, warn};

use crate::app::cache::{CacheStore, ReleaseOutcome};
use crate::app::mode::{FormattedSerial, SerializationMode};
use crate::app::queue::QueueStore;
use crate::app::reconciler::{FinalizeAction, PrintOutcome, Reconciler};
use crate::errors::{AppError, CacheError, CacheResult, Result};

/// Where an allocated number came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationSource {
    /// Reused from the reservation cache
    Cached,
    /// Freshly drawn from the queue
    Drawn,
}

/// A serial handed out for one print attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub serial: FormattedSerial,
    pub mode: SerializationMode,
    pub source: AllocationSource,
}

/// Allocates serials and reconciles print outcomes
#[derive(Debug)]
pub struct Serializer {
    queues: HashMap<SerializationMode, QueueStore>,
    cache: Arc<CacheStore>,
    reconciler: Reconciler,
    /// One guard per part, held across find, draw and the cache update
    part_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Serializer {
    /// Create a serializer over one queue per mode and a shared cache
    ///
    /// A later queue for the same mode replaces an earlier one.
    pub fn new(queues: impl IntoIterator<Item = QueueStore>, cache: Arc<CacheStore>) -> Self {
        let queues = queues
            .into_iter()
            .map(|queue| (queue.mode(), queue))
            .collect();

        Self {
            queues,
            reconciler: Reconciler::new(Arc::clone(&cache)),
            cache,
            part_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Queue store serving `mode`
    pub fn queue(&self, mode: SerializationMode) -> Result<&QueueStore> {
        self.queues
            .get(&mode)
            .ok_or_else(|| AppError::generic(format!("No {} queue is configured", mode)))
    }

    /// Shared reservation cache
    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    /// Allocate a serial for the next label of `part`
    ///
    /// A number held in the cache is reused; otherwise one is drawn from the
    /// `mode` queue. A full unit drops any hold on the number, a partial unit
    /// keeps holding it so the next print of the same lot shows the same
    /// serial. [`Serializer::finalize`] confirms or reverses that decision once
    /// the print outcome is known.
    ///
    /// # Errors
    ///
    /// Queue and cache errors propagate unchanged in kind, except that a cache
    /// failure after a fresh draw becomes `UnrecordedDraw` carrying the drawn
    /// serial. A held number above the mode's ceiling is `OutOfRange` and is
    /// never issued.
    pub async fn allocate(
        &self,
        part: &str,
        mode: SerializationMode,
        is_full_unit: bool,
    ) -> Result<Allocation> {
        let queue = self.queue(mode)?;
        let _part_guard = self.lock_part(part).await;

        let (issued, source) = match self.cache.find(part).await? {
            Some(held) if held > mode.ceiling() => {
                warn!(
                    "Reserved number {} for {} exceeds the {} ceiling {}",
                    held,
                    part,
                    mode,
                    mode.ceiling()
                );
                return Err(CacheError::OutOfRange {
                    part: part.to_string(),
                    held,
                    mode,
                }
                .into());
            }
            Some(held) => {
                debug!("Reusing reserved number {} for {}", held, part);
                (held, AllocationSource::Cached)
            }
            None => (queue.draw(part).await?, AllocationSource::Drawn),
        };

        let serial = mode.format(issued);

        if let Err(e) = self.update_hold(part, issued, is_full_unit).await {
            if source == AllocationSource::Drawn {
                // The queue has already advanced; this is the only record of the number
                error!(
                    "Drew {} serial {} for {} but could not update the reservation cache: {}",
                    mode, serial, part, e
                );
                return Err(AppError::UnrecordedDraw {
                    part: part.to_string(),
                    serial,
                    source: e,
                });
            }
            return Err(e.into());
        }

        info!(
            "Allocated {} serial {} for {} ({:?}, full unit {})",
            mode, serial, part, source, is_full_unit
        );
        Ok(Allocation {
            serial,
            mode,
            source,
        })
    }

    /// Record the outcome of printing `serial` for `part`
    ///
    /// See [`Reconciler::finalize`].
    pub async fn finalize(
        &self,
        part: &str,
        serial: &FormattedSerial,
        outcome: PrintOutcome,
        is_full_unit: bool,
    ) -> Result<FinalizeAction> {
        let _part_guard = self.lock_part(part).await;
        Ok(self
            .reconciler
            .finalize(part, serial, outcome, is_full_unit)
            .await?)
    }

    /// Next number the `mode` queue would issue for `part`
    pub async fn peek(&self, part: &str, mode: SerializationMode) -> Result<u64> {
        Ok(self.queue(mode)?.peek(part).await?)
    }

    async fn lock_part(&self, part: &str) -> OwnedMutexGuard<()> {
        let part_lock = {
            let mut locks = self.part_locks.lock().await;
            Arc::clone(locks.entry(part.to_string()).or_default())
        };
        part_lock.lock_owned().await
    }

    async fn update_hold(&self, part: &str, issued: u64, is_full_unit: bool) -> CacheResult<()> {
        if is_full_unit {
            match self.cache.release(part, issued).await? {
                ReleaseOutcome::Released => debug!("Released hold on {} for {}", issued, part),
                ReleaseOutcome::NotHeld => {}
                ReleaseOutcome::Mismatch { held } => {
                    warn!("{} holds {} while allocating {}", part, held, issued)
                }
            }
        } else {
            self.cache.reserve(part, issued).await?;
        }
        Ok(())
    }
}
