use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// ffmpeg ran and exited non-zero; `stderr` is passed through verbatim.
    #[error("{context}: {stderr}")]
    Processing { context: String, stderr: String },

    /// ffmpeg could not be started at all.
    #[error("Media processing error: {0}")]
    Media(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    PayloadTooLarge(String),
}

impl DashError {
    pub fn not_found() -> Self {
        DashError::NotFound("File not found".to_string())
    }

    pub fn processing<C: Into<String>, S: Into<String>>(context: C, stderr: S) -> Self {
        DashError::Processing {
            context: context.into(),
            stderr: stderr.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DashError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_message_carries_stderr() {
        let err = DashError::processing("FFmpeg error", "Invalid data found when processing input");
        assert_eq!(
            err.to_string(),
            "FFmpeg error: Invalid data found when processing input"
        );
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(DashError::not_found().to_string(), "File not found");
    }
}
