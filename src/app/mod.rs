//! Core serial allocation logic
//!
//! This module contains the shared queue of never-issued numbers, the local
//! reservation cache, and the serializer that combines them into an
//! allocate/finalize cycle around each physical print.
//!
//! # Examples
//!
//! ```rust,no_run
//! use label_serials::app::{
//!     CacheConfig, CacheStore, PrintOutcome, QueueStore, QueueStoreConfig, SerializationMode,
//!     Serializer,
//! };
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let shared = Path::new("/mnt/serials");
//! let queues = [SerializationMode::Jbk, SerializationMode::Lot]
//!     .map(|mode| QueueStore::new(QueueStoreConfig::in_directory(mode, shared)));
//! let cache = Arc::new(CacheStore::new(CacheConfig::default())?);
//! let serializer = Serializer::new(queues, cache);
//!
//! let allocation = serializer.allocate("PN-100", SerializationMode::Jbk, true).await?;
//! // Print the label, then report what happened
//! let printed = true;
//! serializer
//!     .finalize("PN-100", &allocation.serial, PrintOutcome::from(printed), true)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod document;
pub mod mode;
pub mod queue;
pub mod reconciler;
pub mod serializer;

// Re-export main public API
pub use cache::{CacheConfig, CacheStore, ConflictPolicy, ReleaseOutcome, ReserveOutcome};
pub use mode::{FormattedSerial, SerializationMode};
pub use queue::{QueueStore, QueueStoreConfig};
pub use reconciler::{FinalizeAction, PrintOutcome, Reconciler};
pub use serializer::{Allocation, AllocationSource, Serializer};
