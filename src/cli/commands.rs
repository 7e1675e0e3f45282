//! Command handlers for the label serials CLI
//!
//! This module implements the command handlers that connect CLI arguments
//! to the serializer, queue and cache.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::app::{
    AllocationSource, FinalizeAction, FormattedSerial, PrintOutcome, ReleaseOutcome,
    ReserveOutcome,
};
use crate::cli::{
    AllocateArgs, CacheAction, CacheArgs, ConfigAction, ConfigArgs, FinalizeArgs, QueueAction,
    QueueArgs,
};
use crate::config::AppConfig;
use crate::errors::{AppError, Result};

/// Handle the allocate command
///
/// Prints the allocated serial alone on stdout so scripts can capture it.
pub async fn handle_allocate(config: &AppConfig, args: AllocateArgs) -> Result<()> {
    let serializer = config.serializer()?;

    let allocation = serializer
        .allocate(&args.part, args.mode, args.is_full_unit())
        .await?;

    if allocation.source == AllocationSource::Cached {
        info!(
            "Reused held serial {} for {}",
            allocation.serial, args.part
        );
    }

    println!("{}", allocation.serial);
    Ok(())
}

/// Handle the finalize command
pub async fn handle_finalize(config: &AppConfig, args: FinalizeArgs) -> Result<()> {
    let serializer = config.serializer()?;
    let serial = FormattedSerial::parse(&args.serial)?;
    let outcome = PrintOutcome::from(args.succeeded());

    let action = serializer
        .finalize(&args.part, &serial, outcome, args.is_full_unit())
        .await?;

    match action {
        FinalizeAction::Released(ReleaseOutcome::Released) => {
            println!("✅ {} for {} is finished and released", serial, args.part);
        }
        FinalizeAction::Released(ReleaseOutcome::NotHeld) => {
            println!("✅ {} for {} is finished", serial, args.part);
        }
        FinalizeAction::Released(ReleaseOutcome::Mismatch { held }) => {
            warn!("{} holds {} rather than {}", args.part, held, serial);
            println!(
                "⚠️  {} for {} is finished, but {} still holds number {}",
                serial, args.part, args.part, held
            );
        }
        FinalizeAction::Held(ReserveOutcome::Replaced { previous }) => {
            println!(
                "⚠️  {} is held for {}, replacing previously held number {}",
                serial, args.part, previous
            );
        }
        FinalizeAction::Held(_) => {
            println!("📌 {} is held for {}", serial, args.part);
        }
    }

    Ok(())
}

/// Handle queue inspection commands
pub async fn handle_queue(config: &AppConfig, args: QueueArgs) -> Result<()> {
    let serializer = config.serializer()?;

    match args.action {
        QueueAction::Peek { part, mode } => {
            let next = serializer.peek(&part, mode).await?;
            println!("{}", mode.format(next));
        }
        QueueAction::List { mode } => {
            let queue = serializer.queue(mode)?;
            let entries = queue.entries().await?;

            println!("{} queue: {}", mode, queue.path().display());
            if entries.is_empty() {
                println!("  (no parts provisioned)");
            }
            for (part, next) in &entries {
                println!("  {:<24} next {}", part, mode.format(*next));
            }
        }
    }

    Ok(())
}

/// Handle cache management commands
pub async fn handle_cache(config: &AppConfig, args: CacheArgs) -> Result<()> {
    let serializer = config.serializer()?;
    let cache = serializer.cache();

    match args.action {
        CacheAction::List => {
            let entries = cache.entries().await?;
            println!("Reservations: {}", cache.document_path().display());
            if entries.is_empty() {
                println!("  (nothing held)");
            }
            for (part, held) in &entries {
                println!("  {:<24} {}", part, held);
            }
        }
        CacheAction::Find { part } => match cache.find(&part).await? {
            Some(held) => println!("{}", held),
            None => {
                return Err(AppError::generic(format!(
                    "No number is held for {}",
                    part
                )))
            }
        },
        CacheAction::Release { part, serial } => {
            let serial = FormattedSerial::parse(&serial)?;
            match cache.release(&part, serial.value()).await? {
                ReleaseOutcome::Released => println!("✅ Released {} for {}", serial, part),
                ReleaseOutcome::NotHeld => println!("Nothing is held for {}", part),
                ReleaseOutcome::Mismatch { held } => {
                    return Err(AppError::generic(format!(
                        "{} holds {}, not {}; nothing released",
                        part, held, serial
                    )))
                }
            }
        }
    }

    Ok(())
}

/// Handle configuration commands
pub async fn handle_config(
    config: &AppConfig,
    config_path: Option<PathBuf>,
    args: ConfigArgs,
) -> Result<()> {
    match args.action {
        ConfigAction::Init => {
            let (path, created) = AppConfig::initialize_first_run().await?;
            if created {
                println!("📁 Created default configuration file:");
                println!("   {}", path.display());
                println!("   You can customize settings by editing this file.");
            } else {
                println!("Configuration file already exists: {}", path.display());
            }
        }
        ConfigAction::Show => {
            if let Some(path) = config_path {
                println!("# Loaded from {}", path.display());
            }
            let rendered = toml::to_string_pretty(config)
                .map_err(|e| AppError::generic(format!("Failed to render config: {}", e)))?;
            println!("{}", rendered);
        }
    }

    Ok(())
}
