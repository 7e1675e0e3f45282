//! Command-line argument parsing for label serial allocation
//!
//! This module defines the CLI structure using clap derive macros. The
//! commands mirror the library contract: allocate before printing, finalize
//! once the print resolves, plus operator views of the queue and cache.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::app::SerializationMode;

/// Label Serials - durable JBK and Lot numbers for production labels
#[derive(Parser, Debug)]
#[command(
    name = "label_serials",
    version,
    about = "Allocate and reconcile JBK and Lot serial numbers for production labels",
    long_about = "Allocates serial numbers from a queue shared by every workstation and holds them in a local
reservation cache until the labelled unit is finished, so failed prints never lose or duplicate a number."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Allocate a serial for the next label of a part
    Allocate(AllocateArgs),

    /// Report the outcome of a print attempt
    Finalize(FinalizeArgs),

    /// Inspect the shared queues
    Queue(QueueArgs),

    /// Inspect and repair the local reservation cache
    Cache(CacheArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments for the allocate command
#[derive(Args, Debug, Clone)]
pub struct AllocateArgs {
    /// Part identifier
    #[arg(short, long)]
    pub part: String,

    /// Serialization mode (jbk or lot)
    #[arg(short, long)]
    pub mode: SerializationMode,

    /// The basket is a partial unit; keep holding the number afterwards
    #[arg(long)]
    pub partial: bool,
}

/// Arguments for the finalize command
#[derive(Args, Debug, Clone)]
pub struct FinalizeArgs {
    /// Part identifier
    #[arg(short, long)]
    pub part: String,

    /// Serial that was printed
    #[arg(short, long)]
    pub serial: String,

    /// The print attempt failed
    #[arg(long)]
    pub failed: bool,

    /// The basket is a partial unit
    #[arg(long)]
    pub partial: bool,
}

/// Arguments for queue inspection
#[derive(Args, Debug)]
pub struct QueueArgs {
    #[command(subcommand)]
    pub action: QueueAction,
}

/// Queue inspection actions
#[derive(Subcommand, Debug)]
pub enum QueueAction {
    /// Show the next number a part would be issued
    Peek {
        /// Part identifier
        #[arg(short, long)]
        part: String,

        /// Serialization mode (jbk or lot)
        #[arg(short, long)]
        mode: SerializationMode,
    },

    /// List every provisioned part in a queue
    List {
        /// Serialization mode (jbk or lot)
        #[arg(short, long)]
        mode: SerializationMode,
    },
}

/// Arguments for cache management
#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache management actions
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List every held reservation
    List,

    /// Show the number held for a part
    Find {
        /// Part identifier
        #[arg(short, long)]
        part: String,
    },

    /// Release a held number by hand
    Release {
        /// Part identifier
        #[arg(short, long)]
        part: String,

        /// Serial currently held
        #[arg(short, long)]
        serial: String,
    },
}

/// Arguments for configuration management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a default configuration file if none exists
    Init,

    /// Print the effective configuration
    Show,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level based on global arguments
    pub fn log_level(&self) -> tracing::Level {
        if self.global.quiet {
            tracing::Level::ERROR
        } else if self.global.very_verbose {
            tracing::Level::DEBUG
        } else if self.global.verbose {
            tracing::Level::INFO
        } else {
            tracing::Level::WARN
        }
    }
}

impl AllocateArgs {
    /// Whether the basket is a complete unit
    pub fn is_full_unit(&self) -> bool {
        !self.partial
    }
}

impl FinalizeArgs {
    /// Whether the basket is a complete unit
    pub fn is_full_unit(&self) -> bool {
        !self.partial
    }

    /// Whether the print succeeded
    pub fn succeeded(&self) -> bool {
        !self.failed
    }
}
