use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Result, DashError};

// Default values for optional configuration keys
fn default_max_upload_mb() -> u64 {
    2048
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_log_file_name() -> String {
    "ffdash.log".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub media: MediaConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// TCP port to listen on
    pub port: u16,
    /// Maximum request body size for uploads, in megabytes
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: u64,
    /// Allowed CORS origins; "*" allows any origin
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding uploaded source files
    pub upload_dir: PathBuf,
    /// Directory holding files produced by ffmpeg
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory for rolling log files
    pub dir: PathBuf,
    #[serde(default = "default_log_file_name")]
    pub file_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                max_upload_mb: default_max_upload_mb(),
                cors_origins: default_cors_origins(),
            },
            storage: StorageConfig {
                upload_dir: PathBuf::from("uploads"),
                output_dir: PathBuf::from("output"),
            },
            media: MediaConfig {
                binary_path: "ffmpeg".to_string(),
            },
            logging: LoggingConfig {
                dir: PathBuf::from(".ffdash").join("log"),
                file_name: default_log_file_name(),
            },
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn max_upload_bytes(&self) -> usize {
        (self.max_upload_mb as usize).saturating_mul(1024 * 1024)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DashError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| DashError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| DashError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| DashError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}
