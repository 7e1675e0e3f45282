//! Command-line interface components
//!
//! This module contains CLI-specific code for the label serials binary:
//! argument parsing and the command handlers.

pub mod args;
pub mod commands;

pub use args::{
    AllocateArgs, CacheAction, CacheArgs, Cli, Commands, ConfigAction, ConfigArgs, FinalizeArgs,
    GlobalArgs, QueueAction, QueueArgs,
};
pub use commands::{handle_allocate, handle_cache, handle_config, handle_finalize, handle_queue};
