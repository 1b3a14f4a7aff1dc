//! Audio timeline for the create-video operation.
//!
//! A request describes a flat-colour base clip and an ordered list of audio
//! tracks. Each resolved track becomes one filter chain (gain, onset delay,
//! optional trim) and all chains are mixed into a single `[audio]` stream.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::commands::format_number;

fn default_width() -> i64 {
    1920
}

fn default_height() -> i64 {
    1080
}

fn default_fps() -> i64 {
    30
}

fn default_background_color() -> String {
    "black".to_string()
}

fn default_volume() -> f64 {
    1.0
}

/// One audio clip placed on the timeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudioTrack {
    /// Upload name, with or without its extension
    pub file: String,
    /// Onset in seconds
    pub start_time: f64,
    /// Length in seconds; absent means until the track ends
    #[serde(default)]
    pub duration: Option<f64>,
    /// Linear gain, 1.0 leaves the track unchanged
    #[serde(default = "default_volume")]
    pub volume: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoCreateRequest {
    /// Clip length in seconds
    pub duration: f64,
    #[serde(default = "default_width")]
    pub width: i64,
    #[serde(default = "default_height")]
    pub height: i64,
    #[serde(default = "default_fps")]
    pub fps: i64,
    #[serde(default = "default_background_color")]
    pub background_color: String,
    #[serde(default)]
    pub audio_tracks: Vec<AudioTrack>,
}

/// A track whose source file was found in the upload directory
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTrack {
    pub path: PathBuf,
    pub start_time: f64,
    pub duration: Option<f64>,
    pub volume: f64,
}

impl ResolvedTrack {
    pub fn new(track: &AudioTrack, path: PathBuf) -> Self {
        Self {
            path,
            start_time: track.start_time,
            duration: track.duration,
            volume: track.volume,
        }
    }

    /// Onset in whole milliseconds, truncated toward zero
    pub fn delay_millis(&self) -> i64 {
        (self.start_time * 1000.0).trunc() as i64
    }

    /// Filter chain for this track. `position` is the track's place among the
    /// resolved tracks; input 0 is the base clip so audio inputs start at 1.
    pub fn filter_chain(&self, position: usize) -> String {
        let delay = self.delay_millis();
        let mut chain = format!(
            "[{}:a]volume={},adelay={}|{}",
            position + 1,
            format_number(self.volume),
            delay,
            delay
        );

        // A zero duration means "no trim", same as an absent one.
        if let Some(duration) = self.duration.filter(|d| *d != 0.0) {
            chain.push_str(&format!(",atrim=0:{}", format_number(duration)));
        }

        chain.push_str(&format!("[a{}]", position));
        chain
    }
}

/// lavfi source expression for the base clip
pub fn color_source(request: &VideoCreateRequest) -> String {
    format!(
        "color=c={}:s={}x{}:d={}:r={}",
        request.background_color,
        request.width,
        request.height,
        format_number(request.duration),
        request.fps
    )
}

/// Complete `-filter_complex` expression mixing all tracks into `[audio]`.
///
/// Returns `None` when there is nothing to mix.
pub fn filter_graph(tracks: &[ResolvedTrack]) -> Option<String> {
    if tracks.is_empty() {
        return None;
    }

    let chains: Vec<String> = tracks
        .iter()
        .enumerate()
        .map(|(position, track)| track.filter_chain(position))
        .collect();

    let mix_inputs: String = (0..tracks.len()).map(|i| format!("[a{}]", i)).collect();
    let mix = format!(
        "{}amix=inputs={}:duration=longest:dropout_transition=3[audio]",
        mix_inputs,
        tracks.len()
    );

    Some(format!("{};{}", chains.join(";"), mix))
}
