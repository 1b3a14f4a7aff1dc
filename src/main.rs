//! ffdash - FFmpeg Dashboard backend
//!
//! Entry point: parses the command line, loads configuration, sets up
//! logging and runs the requested command.

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing::{info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ffdash::api;
use ffdash::cli::{Args, Commands};
use ffdash::config::{Config, LoggingConfig};
use ffdash::media::MediaProcessorFactory;
use ffdash::storage::Storage;

const DEFAULT_CONFIG_FILE: &str = "ffdash.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration
    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new(DEFAULT_CONFIG_FILE).exists() {
                Config::from_file(DEFAULT_CONFIG_FILE)?
            } else {
                Config::default()
            }
        }
    };

    // Setup logging to both console and file; the guard flushes the file writer on exit
    let _guard = setup_logging(&config.logging, args.verbose)?;

    match args.command {
        Commands::Serve { host, port, upload_dir, output_dir, ffmpeg } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(dir) = upload_dir {
                config.storage.upload_dir = dir;
            }
            if let Some(dir) = output_dir {
                config.storage.output_dir = dir;
            }
            if let Some(binary) = ffmpeg {
                config.media.binary_path = binary;
            }

            info!("Starting ffdash on {}", config.server.bind_address());
            api::serve(&config).await?;
        }
        Commands::Check => {
            let processor = MediaProcessorFactory::create_processor(config.media.clone());
            match processor.get_version_info().await {
                Ok(version) => println!("{}: {}", config.media.binary_path, version),
                Err(e) => anyhow::bail!("{} is not available: {}", config.media.binary_path, e),
            }
        }
        Commands::Files => {
            let storage = Storage::new(&config.storage).await?;
            let files = storage.list_uploads()?;

            if files.is_empty() {
                println!("No uploaded files found in {}.", storage.upload_dir().display());
            } else {
                println!("{:<50} {:>12}", "Filename", "Size (bytes)");
                println!("{}", "-".repeat(63));
                for file in files {
                    println!("{:<50} {:>12}", file.filename, file.size);
                }
            }
        }
        Commands::InitConfig { path } => {
            Config::default().save_to_file(&path)?;
            println!("Wrote default configuration to {}", path.display());
        }
    }

    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(logging: &LoggingConfig, verbose: bool) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&logging.dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&logging.dir, &logging.file_name);
    let (non_blocking_file, guard) = non_blocking(file_appender);

    // Determine log level
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Create console layer
    let console_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    // Create file layer
    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - console: {}, file: {}",
        log_level,
        logging.dir.join(&logging.file_name).display()
    );

    Ok(guard)
}
