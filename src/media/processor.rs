use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{info, debug};

use crate::config::MediaConfig;
use crate::error::{Result, DashError};
use super::{MediaProcessorTrait, MediaCommand, MediaCommandBuilder};

/// Concrete implementation of media processor (FFmpeg-based)
pub struct MediaProcessorImpl {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
}

impl MediaProcessorImpl {
    /// Create a new media processor implementation
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.binary_path);

        Self {
            config,
            command_builder,
        }
    }
}

#[async_trait]
impl MediaProcessorTrait for MediaProcessorImpl {
    fn command_builder(&self) -> MediaCommandBuilder {
        self.command_builder.clone()
    }

    async fn execute_command(&self, command: MediaCommand) -> Result<()> {
        info!("Running {}", command.description);
        command.execute().await?;
        debug!("{} finished", command.description);
        Ok(())
    }

    async fn is_available(&self) -> bool {
        match self.command_builder.version_check().execute().await {
            Ok(()) => true,
            Err(e) => {
                debug!("Media processor unavailable: {}", e);
                false
            }
        }
    }

    async fn get_version_info(&self) -> Result<String> {
        debug!("Getting media processor version information");

        let output = Command::new(&self.config.binary_path)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| DashError::Media(format!("Failed to execute media processor: {}", e)))?;

        if output.status.success() {
            let version_info = String::from_utf8_lossy(&output.stdout);
            // Extract the first line which typically contains the version
            let first_line = version_info.lines().next().unwrap_or("Unknown version");
            Ok(first_line.to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(DashError::processing("Media processor version check failed", stderr))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processor(binary: &str) -> MediaProcessorImpl {
        MediaProcessorImpl::new(MediaConfig {
            binary_path: binary.to_string(),
        })
    }

    #[tokio::test]
    async fn test_missing_binary_is_unavailable() {
        let processor = processor("/nonexistent/ffmpeg-binary");
        assert!(!processor.is_available().await);
        assert!(matches!(
            processor.get_version_info().await,
            Err(DashError::Media(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_surfaces_stderr() {
        let command = MediaCommand::new("sh", "failing command")
            .arg("-c")
            .arg("echo 'Unknown encoder' >&2; exit 1")
            .on_failure("FFmpeg error");

        let err = processor("sh").execute_command(command).await.unwrap_err();
        match err {
            DashError::Processing { context, stderr } => {
                assert_eq!(context, "FFmpeg error");
                assert_eq!(stderr.trim(), "Unknown encoder");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_builder_uses_configured_binary() {
        let check = processor("/usr/local/bin/ffmpeg").command_builder().version_check();
        assert_eq!(check.binary_path, "/usr/local/bin/ffmpeg");
    }
}
