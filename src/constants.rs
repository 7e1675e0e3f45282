//! Application constants for label serial allocation
//!
//! This module centralizes the constants used throughout the crate,
//! organized by functional domain.

use std::time::Duration;

/// Serialization mode parameters
pub mod modes {
    /// Zero-padding width of a JBK serial
    pub const JBK_WIDTH: usize = 3;

    /// Highest issuable JBK number
    pub const JBK_CEILING: u64 = 500;

    /// Zero-padding width of a Lot serial
    pub const LOT_WIDTH: usize = 9;

    /// Highest issuable Lot number
    pub const LOT_CEILING: u64 = 999_999_999;
}

/// File names and suffixes
pub mod files {
    /// Application directory name under the OS data/config directories
    pub const APP_DIR_NAME: &str = "label-serials";

    /// Default JBK queue document name
    pub const JBK_QUEUE_FILE: &str = "jbk_queue.json";

    /// Default Lot queue document name
    pub const LOT_QUEUE_FILE: &str = "lot_queue.json";

    /// Directory holding the reservation document, removed when empty
    pub const RESERVATIONS_DIR: &str = "reservations";

    /// Reservation document name
    pub const RESERVATIONS_FILE: &str = "reservations.json";

    /// Temporary file suffix for atomic writes
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";

    /// Suffix of the advisory lock file kept next to each queue document
    pub const LOCK_FILE_SUFFIX: &str = ".lock";

    /// Project-local configuration file name
    pub const LOCAL_CONFIG_FILE: &str = "label-serials.toml";
}

/// Queue lock and shared storage timing
pub mod lock {
    use super::Duration;

    /// How long to keep retrying a contended queue lock
    pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10);

    /// Upper bound on a whole queue operation against shared storage
    pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(30);

    /// First retry delay after finding the lock held
    pub const INITIAL_RETRY_INTERVAL: Duration = Duration::from_millis(5);

    /// Longest single retry delay
    pub const MAX_RETRY_INTERVAL: Duration = Duration::from_millis(250);
}

/// Logging constants
pub mod logging {
    /// Default log level
    pub const DEFAULT_LOG_LEVEL: &str = "warn";
}

pub use files::{APP_DIR_NAME, TEMP_FILE_SUFFIX};
pub use modes::{JBK_CEILING, JBK_WIDTH, LOT_CEILING, LOT_WIDTH};
