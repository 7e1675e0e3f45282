//! Reservation cache for drawn serial numbers
//!
//! This module holds numbers that have been drawn from the queue but not yet
//! committed to a finished unit, so a failed print or an open partial lot can
//! reuse the same number instead of consuming a new one.
//!
//! # Key Features
//!
//! - **Local durability**: reservations survive process restarts
//! - **One hold per part**: conflicting holds are rejected or overwritten per
//!   [`ConflictPolicy`]
//! - **Guarded release**: a hold is only removed by the value it holds
//! - **Self-cleaning**: the document and its directory disappear when the last
//!   hold is released and come back on the next reservation
//!
//! # Module Organization
//!
//! - [`config`] - Configuration types and defaults
//! - [`reservation`] - Reserve and release outcomes
//! - [`store`] - The cache store itself
//!
//! # Examples
//!
//! ```rust,no_run
//! use label_serials::app::cache::{CacheConfig, CacheStore, ReleaseOutcome};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = CacheStore::new(CacheConfig::default())?;
//!
//! cache.reserve("PN-100", 17).await?;
//! assert_eq!(cache.find("PN-100").await?, Some(17));
//!
//! match cache.release("PN-100", 17).await? {
//!     ReleaseOutcome::Released => println!("Unit finished"),
//!     other => println!("Nothing released: {:?}", other),
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod reservation;
pub mod store;

// Re-export main public API
pub use config::{CacheConfig, ConflictPolicy};
pub use reservation::{ReleaseOutcome, ReserveOutcome};
pub use store::CacheStore;
