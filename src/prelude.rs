//! Prelude module for the Label Serials library
//!
//! Re-exports the items a print pipeline needs to allocate and finalize
//! serials with a single `use label_serials::prelude::*;`.
//!
//! # Usage
//!
//! ```rust,no_run
//! use label_serials::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let serializer = AppConfig::load(None).await?.serializer()?;
//!
//!     let allocation = serializer.allocate("PN-100", SerializationMode::Lot, false).await?;
//!     serializer
//!         .finalize("PN-100", &allocation.serial, PrintOutcome::Succeeded, false)
//!         .await?;
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

// Allocation and reconciliation
pub use crate::app::{
    Allocation, AllocationSource, CacheConfig, CacheStore, ConflictPolicy, FinalizeAction,
    FormattedSerial, PrintOutcome, QueueStore, QueueStoreConfig, SerializationMode, Serializer,
};

// Configuration
pub use crate::config::AppConfig;

pub use std::sync::Arc;
