//! Queue Store: shared, durable per-part counters
//!
//! One queue document exists per serialization mode. It maps each
//! provisioned part identifier to the next number that has never been issued,
//! and lives on storage shared by every workstation that prints labels.
//!
//! # Key Features
//!
//! - **Cross-process mutual exclusion**: draws hold an OS advisory lock on a
//!   sibling `.lock` file for the whole load-mutate-save cycle
//! - **Atomic publication**: the advanced counter is written to a temporary
//!   file and renamed into place, so a draw is never half applied
//! - **Bounded waits**: lock contention and stalled storage surface as
//!   `LockTimeout` and `Timeout` rather than hanging the caller
//!
//! # Module Organization
//!
//! - [`config`] - Per-document configuration
//! - [`lock`] - Advisory lock on the queue document
//! - [`store`] - Peek and draw operations
//!
//! # Examples
//!
//! ```rust,no_run
//! use label_serials::app::mode::SerializationMode;
//! use label_serials::app::queue::{QueueStore, QueueStoreConfig};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = QueueStoreConfig::in_directory(SerializationMode::Jbk, Path::new("/mnt/serials"));
//! let queue = QueueStore::new(config);
//!
//! let issued = queue.draw("PN-100").await?;
//! println!("Issued {}", SerializationMode::Jbk.format(issued));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod lock;
pub mod store;

// Re-export main public API
pub use config::QueueStoreConfig;
pub use lock::QueueLock;
pub use store::QueueStore;
