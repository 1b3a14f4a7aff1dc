use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        /// Interface to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory for uploaded files
        #[arg(long)]
        upload_dir: Option<PathBuf>,

        /// Directory for processed files
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Path to the ffmpeg binary
        #[arg(long)]
        ffmpeg: Option<String>,
    },

    /// Check that ffmpeg can be executed and print its version
    Check,

    /// List uploaded files
    Files,

    /// Write the default configuration to a file
    InitConfig {
        /// Destination path
        #[arg(default_value = "ffdash.toml")]
        path: PathBuf,
    },
}
