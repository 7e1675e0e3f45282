//! Label Serials Library
//!
//! Durable allocation of JBK and Lot serial numbers for production labels.
//! A shared, lock-guarded queue issues numbers that are never reused, and a
//! local reservation cache holds a drawn number until the labelled unit is
//! finished, so failed prints and partial lots never lose or duplicate one.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
