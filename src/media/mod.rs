// Media processing layer
//
// - Commands: argument templates per operation and the command builder
// - Timeline: request types and filter graph for video creation
// - Processor: runs commands against the ffmpeg binary

pub mod commands;
pub mod processor;
pub mod timeline;

use async_trait::async_trait;
use std::sync::Arc;

pub use commands::*;
pub use processor::*;
pub use timeline::*;

use crate::config::MediaConfig;
use crate::error::Result;

/// Runs media commands. Handlers depend on this seam rather than on ffmpeg directly.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaProcessorTrait: Send + Sync {
    /// Command builder bound to the configured binary
    fn command_builder(&self) -> MediaCommandBuilder;

    /// Run a command to completion
    async fn execute_command(&self, command: MediaCommand) -> Result<()>;

    /// Whether the binary can be started and reports a version
    async fn is_available(&self) -> bool;

    /// First line of `-version` output
    async fn get_version_info(&self) -> Result<String>;
}

/// Factory for creating media processor instances
pub struct MediaProcessorFactory;

impl MediaProcessorFactory {
    /// Create the default media processor implementation (FFmpeg-based)
    pub fn create_processor(config: MediaConfig) -> Arc<dyn MediaProcessorTrait> {
        Arc::new(processor::MediaProcessorImpl::new(config))
    }
}
