//! Label Serials CLI application
//!
//! Command-line interface for allocating JBK and Lot serial numbers and
//! reporting print outcomes back to the reservation cache.

use std::process;

use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

use label_serials::cli::{
    handle_allocate, handle_cache, handle_config, handle_finalize, handle_queue, Cli, Commands,
};
use label_serials::config::AppConfig;
use label_serials::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let config = AppConfig::load(cli.global.config.clone()).await?;

    init_logging(&cli, &config);

    info!("Label Serials v{} starting", env!("CARGO_PKG_VERSION"));
    debug!("Effective configuration: {:?}", config);

    match cli.command {
        Commands::Allocate(args) => {
            info!("Executing allocate command");
            handle_allocate(&config, args).await
        }
        Commands::Finalize(args) => {
            info!("Executing finalize command");
            handle_finalize(&config, args).await
        }
        Commands::Queue(args) => {
            info!("Executing queue command");
            handle_queue(&config, args).await
        }
        Commands::Cache(args) => {
            info!("Executing cache command");
            handle_cache(&config, args).await
        }
        Commands::Config(args) => {
            info!("Executing config command");
            handle_config(&config, cli.global.config.clone(), args).await
        }
    }
}

/// Initialize logging from CLI verbosity flags, falling back to the config file level
fn init_logging(cli: &Cli, config: &AppConfig) {
    let log_level = if cli.global.quiet || cli.global.verbose || cli.global.very_verbose {
        cli.log_level().to_string().to_lowercase()
    } else {
        config.logging.level.clone()
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("label_serials={}", log_level)));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose)
        .with_writer(std::io::stderr)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
