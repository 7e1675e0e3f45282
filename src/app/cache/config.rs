//! Cache configuration types and defaults
//!
//! This module contains the configuration for the local reservation cache,
//! including the policy applied when a part already holds a different number.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What `reserve` does when the part already holds a different number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Fail with `ConflictingReservation`, leaving the held number in place
    #[default]
    Reject,
    /// Replace the held number and log a warning
    Overwrite,
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictPolicy::Reject => write!(f, "reject"),
            ConflictPolicy::Overwrite => write!(f, "overwrite"),
        }
    }
}

impl FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(ConflictPolicy::Reject),
            "overwrite" => Ok(ConflictPolicy::Overwrite),
            other => Err(format!(
                "unknown conflict policy '{}', expected 'reject' or 'overwrite'",
                other
            )),
        }
    }
}

/// Configuration for the reservation cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Root directory for the reservation document (OS-specific if None)
    pub cache_root: Option<PathBuf>,
    /// Behaviour when reserving over a different held number
    pub conflict_policy: ConflictPolicy,
    /// Delete the reservation document and its directory once empty
    pub teardown_on_empty: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_root: None, // Will use OS-specific local data directory
            conflict_policy: ConflictPolicy::Reject,
            teardown_on_empty: true,
        }
    }
}

impl CacheConfig {
    /// Create a new cache configuration with custom cache root
    pub fn with_cache_root(cache_root: PathBuf) -> Self {
        Self {
            cache_root: Some(cache_root),
            ..Default::default()
        }
    }

    /// Set the conflicting reservation policy
    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    /// Enable or disable removal of the empty reservation document
    pub fn with_teardown_on_empty(mut self, enabled: bool) -> Self {
        self.teardown_on_empty = enabled;
        self
    }
}
