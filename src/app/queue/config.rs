//! Queue Store configuration
//!
//! Each serialization mode gets its own queue document on shared storage,
//! with an advisory lock file next to it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app::mode::SerializationMode;
use crate::constants::{files, lock};

/// Configuration for one queue document
#[derive(Debug, Clone)]
pub struct QueueStoreConfig {
    /// Mode whose ceiling governs wraparound
    pub mode: SerializationMode,
    /// Queue document on shared storage
    pub path: PathBuf,
    /// How long to wait for another workstation to release the lock
    pub lock_timeout: Duration,
    /// Upper bound on a whole peek or draw
    pub io_timeout: Duration,
}

impl QueueStoreConfig {
    /// Create a configuration for the document at `path`
    pub fn new(mode: SerializationMode, path: impl Into<PathBuf>) -> Self {
        Self {
            mode,
            path: path.into(),
            lock_timeout: lock::DEFAULT_LOCK_TIMEOUT,
            io_timeout: lock::DEFAULT_IO_TIMEOUT,
        }
    }

    /// Configuration using the default document name for `mode` under `root`
    pub fn in_directory(mode: SerializationMode, root: &Path) -> Self {
        let file_name = match mode {
            SerializationMode::Jbk => files::JBK_QUEUE_FILE,
            SerializationMode::Lot => files::LOT_QUEUE_FILE,
        };
        Self::new(mode, root.join(file_name))
    }

    /// Set lock acquisition timeout
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Set shared storage timeout
    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// Advisory lock file guarding the document
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(files::LOCK_FILE_SUFFIX);
        self.path.with_file_name(name)
    }
}
