use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, DashError};
use super::timeline::{color_source, ResolvedTrack, VideoCreateRequest};

const DEFAULT_ERROR_CONTEXT: &str = "FFmpeg error";

/// Abstract media processing command representation
#[derive(Debug, Clone, PartialEq)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
    /// Prefix of the error message when the binary exits non-zero
    pub error_context: String,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
            error_context: DEFAULT_ERROR_CONTEXT.to_string(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Set video codec
    pub fn video_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:v").arg(codec)
    }

    /// Set audio codec
    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:a").arg(codec)
    }

    /// Copy video stream
    pub fn copy_video(self) -> Self {
        self.video_codec("copy")
    }

    /// Select a stream for the output
    pub fn map<S: Into<String>>(self, stream: S) -> Self {
        self.arg("-map").arg(stream)
    }

    /// Set the message prefix used when the command fails
    pub fn on_failure<S: Into<String>>(mut self, context: S) -> Self {
        self.error_context = context.into();
        self
    }

    /// The output path, which is always the final argument
    pub fn output_path(&self) -> Option<PathBuf> {
        self.args.last().map(PathBuf::from)
    }

    /// Execute the command, waiting for the child to exit
    pub async fn execute(&self) -> Result<()> {
        debug!("Executing media processing command: {} {:?}", self.binary_path, self.args);
        debug!("Description: {}", self.description);

        let output = Command::new(&self.binary_path)
            .args(&self.args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| DashError::Media(format!("Failed to execute media processor: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DashError::processing(&self.error_context, stderr));
        }

        Ok(())
    }
}

/// Single-input transformations and their ffmpeg argument templates
#[derive(Debug, Clone, PartialEq)]
pub enum MediaOperation {
    /// Re-encode video with the given CRF, audio copied
    Compress { quality: i64 },
    /// Scale video, audio copied
    Resize { width: i64, height: i64 },
    /// Seek and take a duration, both streams copied. Times pass through verbatim.
    Cut { start_time: String, duration: String },
    /// Linear gain on the audio stream, video copied
    Volume { volume: f64 },
    /// Rectangular crop, keeps the input's extension
    Crop { x: i64, y: i64, width: i64, height: i64 },
}

impl MediaOperation {
    pub fn name(&self) -> &'static str {
        match self {
            MediaOperation::Compress { .. } => "compress",
            MediaOperation::Resize { .. } => "resize",
            MediaOperation::Cut { .. } => "cut",
            MediaOperation::Volume { .. } => "audio-volume",
            MediaOperation::Crop { .. } => "crop-image",
        }
    }

    /// Suffix appended to the identifier in the output file name
    pub fn suffix(&self) -> &'static str {
        match self {
            MediaOperation::Compress { .. } => "compressed",
            MediaOperation::Resize { .. } => "resized",
            MediaOperation::Cut { .. } => "cut",
            MediaOperation::Volume { .. } => "volume",
            MediaOperation::Crop { .. } => "cropped",
        }
    }

    /// Output file name: `{file_id}_{suffix}.mp4`, or the input's own extension for crops.
    pub fn output_file_name(&self, file_id: &str, input: &Path) -> String {
        match self {
            MediaOperation::Crop { .. } => {
                let extension = input
                    .extension()
                    .map(|ext| format!(".{}", ext.to_string_lossy()))
                    .unwrap_or_default();
                format!("{}_{}{}", file_id, self.suffix(), extension)
            }
            _ => format!("{}_{}.mp4", file_id, self.suffix()),
        }
    }

    /// Arguments placed between the input and the output path
    pub fn arguments(&self) -> Vec<String> {
        match self {
            MediaOperation::Compress { quality } => vec![
                "-c:v".to_string(),
                "libx264".to_string(),
                "-crf".to_string(),
                quality.to_string(),
                "-c:a".to_string(),
                "copy".to_string(),
            ],
            MediaOperation::Resize { width, height } => vec![
                "-vf".to_string(),
                format!("scale={}:{}", width, height),
                "-c:a".to_string(),
                "copy".to_string(),
            ],
            MediaOperation::Cut { start_time, duration } => vec![
                "-ss".to_string(),
                start_time.clone(),
                "-t".to_string(),
                duration.clone(),
                "-c".to_string(),
                "copy".to_string(),
            ],
            MediaOperation::Volume { volume } => vec![
                "-filter:a".to_string(),
                format!("volume={}", format_number(*volume)),
                "-c:v".to_string(),
                "copy".to_string(),
            ],
            MediaOperation::Crop { x, y, width, height } => vec![
                "-filter:v".to_string(),
                format!("crop={}:{}:{}:{}", width, height, x, y),
            ],
        }
    }
}

/// Format a float the way clients of the dashboard expect to see it in
/// filter expressions: integral values keep one fractional digit.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Builder for the dashboard's media processing commands
#[derive(Debug, Clone)]
pub struct MediaCommandBuilder {
    binary_path: String,
}

impl MediaCommandBuilder {
    /// Create a new command builder
    pub fn new<S: Into<String>>(binary_path: S) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    /// Build a single-input transformation command
    pub fn operation<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        operation: &MediaOperation,
        input_path: P,
        output_path: Q,
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, operation.name())
            .overwrite()
            .input(input_path)
            .args(operation.arguments())
            .output(output_path)
    }

    /// Build the silent, flat-colour base clip for video creation
    pub fn color_clip<P: AsRef<Path>>(
        &self,
        request: &VideoCreateRequest,
        output_path: P,
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Base video creation")
            .overwrite()
            .arg("-f").arg("lavfi")
            .arg("-i").arg(color_source(request))
            .video_codec("libx264")
            .arg("-pix_fmt").arg("yuv420p")
            .output(output_path)
            .on_failure("Base video creation failed")
    }

    /// Build the command muxing a mixed audio timeline against the base clip
    pub fn mix_timeline<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        base_video: P,
        tracks: &[ResolvedTrack],
        filter_graph: &str,
        output_path: Q,
    ) -> MediaCommand {
        let mut cmd = MediaCommand::new(&self.binary_path, "Audio timeline mixing")
            .overwrite()
            .input(base_video);

        for track in tracks {
            cmd = cmd.input(&track.path);
        }

        cmd.arg("-filter_complex").arg(filter_graph)
            .map("0:v")
            .map("[audio]")
            .copy_video()
            .audio_codec("aac")
            .arg("-b:a").arg("192k")
            .arg("-shortest")
            .output(output_path)
            .on_failure("Audio mixing failed")
    }

    /// Build version check command
    pub fn version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Version check")
            .arg("-version")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> MediaCommandBuilder {
        MediaCommandBuilder::new("ffmpeg")
    }

    #[test]
    fn test_compress_arguments() {
        let op = MediaOperation::Compress { quality: 23 };
        let cmd = builder().operation(&op, "/up/a.mov", "/out/a_compressed.mp4");
        assert_eq!(
            cmd.args,
            vec!["-y", "-i", "/up/a.mov", "-c:v", "libx264", "-crf", "23", "-c:a", "copy", "/out/a_compressed.mp4"]
        );
        assert_eq!(cmd.error_context, "FFmpeg error");
    }

    #[test]
    fn test_resize_arguments() {
        let op = MediaOperation::Resize { width: 1280, height: 720 };
        let cmd = builder().operation(&op, "in.mp4", "out.mp4");
        assert_eq!(cmd.args, vec!["-y", "-i", "in.mp4", "-vf", "scale=1280:720", "-c:a", "copy", "out.mp4"]);
    }

    #[test]
    fn test_cut_passes_times_verbatim() {
        let op = MediaOperation::Cut {
            start_time: "00:01:30".to_string(),
            duration: "12.5".to_string(),
        };
        let cmd = builder().operation(&op, "in.mp4", "out.mp4");
        assert_eq!(
            cmd.args,
            vec!["-y", "-i", "in.mp4", "-ss", "00:01:30", "-t", "12.5", "-c", "copy", "out.mp4"]
        );
    }

    #[test]
    fn test_volume_arguments() {
        let cmd = builder().operation(&MediaOperation::Volume { volume: 1.0 }, "in.mp4", "out.mp4");
        assert_eq!(cmd.args, vec!["-y", "-i", "in.mp4", "-filter:a", "volume=1.0", "-c:v", "copy", "out.mp4"]);

        let cmd = builder().operation(&MediaOperation::Volume { volume: 0.35 }, "in.mp4", "out.mp4");
        assert_eq!(cmd.args[4], "volume=0.35");
    }

    #[test]
    fn test_crop_arguments_order_is_width_height_x_y() {
        let op = MediaOperation::Crop { x: 10, y: 20, width: 300, height: 200 };
        let cmd = builder().operation(&op, "in.png", "out.png");
        assert_eq!(cmd.args, vec!["-y", "-i", "in.png", "-filter:v", "crop=300:200:10:20", "out.png"]);
    }

    #[test]
    fn test_output_file_names() {
        let input = Path::new("/up/abc.mov");
        assert_eq!(MediaOperation::Compress { quality: 23 }.output_file_name("abc", input), "abc_compressed.mp4");
        assert_eq!(MediaOperation::Resize { width: 1, height: 1 }.output_file_name("abc", input), "abc_resized.mp4");
        assert_eq!(
            MediaOperation::Cut { start_time: "0".into(), duration: "1".into() }.output_file_name("abc", input),
            "abc_cut.mp4"
        );
        assert_eq!(MediaOperation::Volume { volume: 2.0 }.output_file_name("abc", input), "abc_volume.mp4");
    }

    #[test]
    fn test_crop_keeps_input_extension() {
        let op = MediaOperation::Crop { x: 0, y: 0, width: 1920, height: 1080 };
        assert_eq!(op.output_file_name("abc", Path::new("/up/abc.jpeg")), "abc_cropped.jpeg");
        assert_eq!(op.output_file_name("abc", Path::new("/up/abc")), "abc_cropped");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1.0), "1.0");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(2.25), "2.25");
        assert_eq!(format_number(-3.0), "-3.0");
        assert_eq!(format_number(10.0), "10.0");
    }

    #[test]
    fn test_output_path_is_last_argument() {
        let cmd = builder().operation(&MediaOperation::Compress { quality: 30 }, "in.mp4", "/out/x.mp4");
        assert_eq!(cmd.output_path(), Some(PathBuf::from("/out/x.mp4")));
        assert_eq!(builder().version_check().args, vec!["-version"]);
    }
}
