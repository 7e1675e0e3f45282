//! Error types for label serial allocation
//!
//! Each store has its own error enum so callers can tell an unprovisioned
//! part from a storage outage from a reservation conflict. [`AppError`] wraps
//! them for the binary and for callers that don't care which layer failed.

use std::path::PathBuf;
use thiserror::Error;

use crate::app::mode::{FormattedSerial, SerializationMode};

/// Queue Store errors
#[derive(Error, Debug)]
pub enum QueueError {
    /// Part has no provisioned entry in the queue document
    #[error("Part {part} has no {mode} queue entry. Ask an administrator to provision it")]
    NotFound {
        part: String,
        mode: SerializationMode,
    },

    /// Queue document could not be read or written
    #[error("Queue storage unavailable: {path}")]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Another workstation held the queue lock for too long
    #[error("Timed out after {waited_ms} ms waiting for queue lock: {path}")]
    LockTimeout { path: PathBuf, waited_ms: u64 },

    /// Shared storage did not respond in time
    #[error("Queue storage did not respond within {waited_ms} ms: {path}")]
    Timeout { path: PathBuf, waited_ms: u64 },

    /// Queue document content is not a valid part-to-integer mapping
    #[error("Queue document corrupted: {path}: {reason}")]
    Corrupted { path: PathBuf, reason: String },
}

/// Cache Store errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// Reservation document could not be read or written
    #[error("Reservation cache unavailable: {path}")]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A different number is already held for the part
    #[error(
        "Part {part} already holds reserved number {held}, refusing to reserve {requested}. Finish or release the previous unit first"
    )]
    ConflictingReservation {
        part: String,
        held: u64,
        requested: u64,
    },

    /// Reservation document content is not a valid part-to-integer mapping
    #[error("Reservation cache corrupted: {path}: {reason}")]
    Corrupted { path: PathBuf, reason: String },

    /// Held number cannot be issued as a serial of the requested mode
    #[error(
        "Part {part} holds reserved number {held}, which is outside the {mode} range. Release it before allocating {mode} serials"
    )]
    OutOfRange {
        part: String,
        held: u64,
        mode: SerializationMode,
    },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Queue error
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// Cache error
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Serial string handed back by a caller is not a serial
    #[error("Invalid serial '{value}': {reason}")]
    InvalidSerial { value: String, reason: String },

    /// A number was drawn from the queue but could not be held or released
    #[error(
        "Drew serial {serial} for {part} but could not record it in the reservation cache. Note the serial before retrying"
    )]
    UnrecordedDraw {
        part: String,
        serial: FormattedSerial,
        #[source]
        source: CacheError,
    },

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is transient and the whole allocation can be retried
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Queue(QueueError::StorageUnavailable { .. })
            | AppError::Queue(QueueError::LockTimeout { .. })
            | AppError::Queue(QueueError::Timeout { .. })
            | AppError::Cache(CacheError::StorageUnavailable { .. }) => true,

            AppError::Queue(QueueError::NotFound { .. })
            | AppError::Queue(QueueError::Corrupted { .. })
            | AppError::Cache(CacheError::ConflictingReservation { .. })
            | AppError::Cache(CacheError::Corrupted { .. })
            | AppError::Cache(CacheError::OutOfRange { .. })
            | AppError::UnrecordedDraw { .. } => false,

            _ => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Queue(_) => "queue",
            AppError::Cache(_) | AppError::UnrecordedDraw { .. } => "cache",
            AppError::Config(_) => "config",
            AppError::InvalidSerial { .. } => "serial",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Queue result type alias
pub type QueueResult<T> = std::result::Result<T, QueueError>;

/// Cache result type alias
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
