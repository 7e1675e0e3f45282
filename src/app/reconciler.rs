//! Print-outcome reconciliation
//!
//! Once a physical print attempt resolves, the caller reports the outcome
//! here exactly once. Only a successful print of a full unit lets go of the
//! number; anything else keeps it reserved so the next allocation for the
//! part reuses it instead of drawing a new one.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::app::cache::{CacheStore, ReleaseOutcome, ReserveOutcome};
use crate::app::mode::FormattedSerial;
use crate::errors::CacheResult;

/// How the physical print attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintOutcome {
    Succeeded,
    Failed,
}

impl From<bool> for PrintOutcome {
    fn from(succeeded: bool) -> Self {
        if succeeded {
            PrintOutcome::Succeeded
        } else {
            PrintOutcome::Failed
        }
    }
}

impl fmt::Display for PrintOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrintOutcome::Succeeded => write!(f, "succeeded"),
            PrintOutcome::Failed => write!(f, "failed"),
        }
    }
}

/// What finalizing did to the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeAction {
    /// The unit is finished; the hold was released
    Released(ReleaseOutcome),
    /// The number stays reserved for the next print of this part
    Held(ReserveOutcome),
}

/// Turns print outcomes into cache mutations
#[derive(Debug, Clone)]
pub struct Reconciler {
    cache: Arc<CacheStore>,
}

impl Reconciler {
    /// Create a reconciler over a shared cache store
    pub fn new(cache: Arc<CacheStore>) -> Self {
        Self { cache }
    }

    /// Record the outcome of printing `serial` for `part`
    ///
    /// | outcome   | unit    | cache effect       |
    /// |-----------|---------|--------------------|
    /// | succeeded | full    | release the number |
    /// | succeeded | partial | keep it reserved   |
    /// | failed    | either  | keep it reserved   |
    ///
    /// # Errors
    ///
    /// Propagates cache failures unchanged, including
    /// `ConflictingReservation` when a different number is already held.
    pub async fn finalize(
        &self,
        part: &str,
        serial: &FormattedSerial,
        outcome: PrintOutcome,
        is_full_unit: bool,
    ) -> CacheResult<FinalizeAction> {
        let value = serial.value();
        debug!(
            "Finalizing {} for {}: print {}, full unit {}",
            serial, part, outcome, is_full_unit
        );

        let action = match (outcome, is_full_unit) {
            (PrintOutcome::Succeeded, true) => {
                FinalizeAction::Released(self.cache.release(part, value).await?)
            }
            (PrintOutcome::Succeeded, false) | (PrintOutcome::Failed, _) => {
                FinalizeAction::Held(self.cache.reserve(part, value).await?)
            }
        };

        info!("Finalized {} for {}: {:?}", serial, part, action);
        Ok(action)
    }
}
