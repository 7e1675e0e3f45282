//! Reservation outcomes
//!
//! A reservation is a provisional hold on a number already drawn from the
//! queue. These types report what a reserve or release actually did so the
//! caller can tell an idempotent repeat from a real state change.

/// Result of reserving a number for a part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// No number was held; the value is now reserved
    Created,
    /// The same value was already held; nothing was written
    AlreadyHeld,
    /// A different value was held and has been replaced
    Replaced { previous: u64 },
}

/// Result of releasing a number for a part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The value was held and has been removed
    Released,
    /// Nothing was held for the part
    NotHeld,
    /// A different value is held; it was left in place
    Mismatch { held: u64 },
}

