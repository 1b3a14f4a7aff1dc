//! Request and response bodies of the HTTP API.

use serde::{Deserialize, Serialize};

use super::extract::FormFields;
use crate::error::Result;
use crate::media::MediaOperation;
use crate::storage::{StoredEntry, StoredFile};
use crate::workflow::ProcessOutcome;

pub const SERVICE_NAME: &str = "FFmpeg Dashboard API";

#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    pub status: String,
    pub service: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub ffmpeg: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub file_id: String,
    pub filename: String,
    pub path: String,
    pub size: u64,
}

impl From<StoredFile> for UploadResponse {
    fn from(file: StoredFile) -> Self {
        Self {
            file_id: file.file_id,
            filename: file.filename,
            path: file.path.to_string_lossy().to_string(),
            size: file.size,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub status: String,
    pub output_file: String,
    pub download_url: String,
}

impl From<ProcessOutcome> for ProcessResponse {
    fn from(outcome: ProcessOutcome) -> Self {
        Self {
            status: "success".to_string(),
            download_url: outcome.download_url(),
            output_file: outcome.output_file.to_string_lossy().to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FileInfo {
    pub filename: String,
    pub size: u64,
    pub path: String,
}

impl From<StoredEntry> for FileInfo {
    fn from(entry: StoredEntry) -> Self {
        Self {
            filename: entry.filename,
            size: entry.size,
            path: entry.path.to_string_lossy().to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilesResponse {
    pub files: Vec<FileInfo>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// Form body of a single-input operation endpoint
pub trait OperationForm: Sized {
    fn from_fields(fields: &FormFields) -> Result<Self>;

    fn file_id(&self) -> &str;

    fn operation(&self) -> MediaOperation;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompressForm {
    pub file_id: String,
    pub quality: i64,
}

impl OperationForm for CompressForm {
    fn from_fields(fields: &FormFields) -> Result<Self> {
        Ok(Self {
            file_id: fields.required("file_id")?,
            quality: fields.parse_or("quality", 23)?,
        })
    }

    fn file_id(&self) -> &str {
        &self.file_id
    }

    fn operation(&self) -> MediaOperation {
        MediaOperation::Compress { quality: self.quality }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResizeForm {
    pub file_id: String,
    pub width: i64,
    pub height: i64,
}

impl OperationForm for ResizeForm {
    fn from_fields(fields: &FormFields) -> Result<Self> {
        Ok(Self {
            file_id: fields.required("file_id")?,
            width: fields.parse_or("width", 1920)?,
            height: fields.parse_or("height", 1080)?,
        })
    }

    fn file_id(&self) -> &str {
        &self.file_id
    }

    fn operation(&self) -> MediaOperation {
        MediaOperation::Resize {
            width: self.width,
            height: self.height,
        }
    }
}

/// Times are `HH:MM:SS` or seconds and are handed to ffmpeg untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct CutForm {
    pub file_id: String,
    pub start_time: String,
    pub duration: String,
}

impl OperationForm for CutForm {
    fn from_fields(fields: &FormFields) -> Result<Self> {
        Ok(Self {
            file_id: fields.required("file_id")?,
            start_time: fields.required("start_time")?,
            duration: fields.required("duration")?,
        })
    }

    fn file_id(&self) -> &str {
        &self.file_id
    }

    fn operation(&self) -> MediaOperation {
        MediaOperation::Cut {
            start_time: self.start_time.clone(),
            duration: self.duration.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VolumeForm {
    pub file_id: String,
    pub volume: f64,
}

impl OperationForm for VolumeForm {
    fn from_fields(fields: &FormFields) -> Result<Self> {
        Ok(Self {
            file_id: fields.required("file_id")?,
            volume: fields.parse_or("volume", 1.0)?,
        })
    }

    fn file_id(&self) -> &str {
        &self.file_id
    }

    fn operation(&self) -> MediaOperation {
        MediaOperation::Volume { volume: self.volume }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CropForm {
    pub file_id: String,
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl OperationForm for CropForm {
    fn from_fields(fields: &FormFields) -> Result<Self> {
        Ok(Self {
            file_id: fields.required("file_id")?,
            x: fields.parse_or("x", 0)?,
            y: fields.parse_or("y", 0)?,
            width: fields.parse_or("width", 1920)?,
            height: fields.parse_or("height", 1080)?,
        })
    }

    fn file_id(&self) -> &str {
        &self.file_id
    }

    fn operation(&self) -> MediaOperation {
        MediaOperation::Crop {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn fields(pairs: &[(&str, &str)]) -> FormFields {
        FormFields::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        )
    }

    #[test]
    fn test_form_defaults() {
        let form = fields(&[("file_id", "abc")]);

        assert_eq!(CompressForm::from_fields(&form).unwrap().quality, 23);

        let resize = ResizeForm::from_fields(&form).unwrap();
        assert_eq!((resize.width, resize.height), (1920, 1080));

        assert_eq!(VolumeForm::from_fields(&form).unwrap().volume, 1.0);

        let crop = CropForm::from_fields(&form).unwrap();
        assert_eq!(
            crop.operation(),
            MediaOperation::Crop { x: 0, y: 0, width: 1920, height: 1080 }
        );
    }

    #[test]
    fn test_cut_requires_times() {
        let form = fields(&[("file_id", "abc"), ("start_time", "00:00:05")]);
        assert!(CutForm::from_fields(&form).is_err());
    }

    #[test]
    fn test_file_id_is_required() {
        assert!(CompressForm::from_fields(&fields(&[("quality", "30")])).is_err());
    }

    #[test]
    fn test_process_response_from_outcome() {
        let response = ProcessResponse::from(ProcessOutcome {
            output_file: PathBuf::from("output/abc_resized.mp4"),
            file_name: "abc_resized.mp4".to_string(),
        });
        assert_eq!(response.status, "success");
        assert_eq!(response.output_file, "output/abc_resized.mp4");
        assert_eq!(response.download_url, "/download/abc_resized.mp4");
    }
}
