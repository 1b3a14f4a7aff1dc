use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::media::{filter_graph, MediaOperation, MediaProcessorTrait, ResolvedTrack, AudioTrack, VideoCreateRequest};
use crate::storage::Storage;

/// A file produced in the output directory
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutcome {
    pub output_file: PathBuf,
    pub file_name: String,
}

impl ProcessOutcome {
    fn new(output_file: PathBuf) -> Self {
        let file_name = output_file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self { output_file, file_name }
    }

    pub fn download_url(&self) -> String {
        format!("/download/{}", self.file_name)
    }
}

/// Dispatches operations: resolve the input, build the command, run it.
pub struct Workflow {
    storage: Storage,
    media: Arc<dyn MediaProcessorTrait>,
}

impl Workflow {
    pub fn new(storage: Storage, media: Arc<dyn MediaProcessorTrait>) -> Self {
        Self { storage, media }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn media(&self) -> &dyn MediaProcessorTrait {
        self.media.as_ref()
    }

    /// Run a single-input operation against an uploaded file
    pub async fn run_operation(&self, file_id: &str, operation: &MediaOperation) -> Result<ProcessOutcome> {
        let input_path = self.storage.resolve_upload(file_id).await?;
        let output_path = self
            .storage
            .output_path(&operation.output_file_name(file_id, &input_path));

        info!("{}: {} -> {}", operation.name(), input_path.display(), output_path.display());

        let command = self
            .media
            .command_builder()
            .operation(operation, &input_path, &output_path);
        self.media.execute_command(command).await?;

        info!("{} completed for {}", operation.name(), file_id);
        Ok(ProcessOutcome::new(output_path))
    }

    /// Build a flat-colour clip and mix the requested audio timeline onto it
    pub async fn create_video(&self, request: &VideoCreateRequest) -> Result<ProcessOutcome> {
        let output_path = self.storage.output_path(&format!("{}_created.mp4", Uuid::new_v4()));
        let temp_path = self.storage.output_path(&format!("temp_{}.mp4", Uuid::new_v4()));
        let builder = self.media.command_builder();

        info!(
            "Creating {}s {}x{} video with {} audio track(s)",
            request.duration,
            request.width,
            request.height,
            request.audio_tracks.len()
        );

        // Nothing exists yet if this fails, so there is nothing to clean up.
        self.media
            .execute_command(builder.color_clip(request, &temp_path))
            .await?;

        let tracks = self.resolve_tracks(&request.audio_tracks).await;

        match filter_graph(&tracks) {
            None => {
                fs::rename(&temp_path, &output_path).await?;
            }
            Some(graph) => {
                let command = builder.mix_timeline(&temp_path, &tracks, &graph, &output_path);
                let result = self.media.execute_command(command).await;

                if let Err(e) = fs::remove_file(&temp_path).await {
                    warn!("Failed to remove temporary clip {}: {}", temp_path.display(), e);
                }
                result?;
            }
        }

        info!("Created video {}", output_path.display());
        Ok(ProcessOutcome::new(output_path))
    }

    /// Tracks whose source cannot be found are dropped from the mix.
    async fn resolve_tracks(&self, tracks: &[AudioTrack]) -> Vec<ResolvedTrack> {
        let mut resolved = Vec::with_capacity(tracks.len());

        for track in tracks {
            match self.storage.resolve_track(&track.file).await {
                Some(path) => resolved.push(ResolvedTrack::new(track, path)),
                None => warn!("Skipping audio track {}: source not found", track.file),
            }
        }

        resolved
    }
}
