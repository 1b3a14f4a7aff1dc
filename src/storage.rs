//! Upload and output directories.
//!
//! Uploads are stored as `{file_id}{extension}` and are never rewritten.
//! Outputs are named by the operation that produced them, so a repeated
//! request replaces the previous result.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::config::StorageConfig;
use crate::error::{Result, DashError};

/// Extensions tried, in order, when an audio track names an upload without one
pub const AUDIO_EXTENSIONS: [&str; 6] = ["mp3", "wav", "aac", "m4a", "ogg", "flac"];

/// A freshly persisted upload
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    pub file_id: String,
    pub filename: String,
    pub path: PathBuf,
    pub size: u64,
}

/// A regular file found in the upload directory
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEntry {
    pub filename: String,
    pub size: u64,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Storage {
    upload_dir: PathBuf,
    output_dir: PathBuf,
}

impl Storage {
    /// Open both directories, creating them if needed
    pub async fn new(config: &StorageConfig) -> Result<Self> {
        for dir in [&config.upload_dir, &config.output_dir] {
            fs::create_dir_all(dir).await.map_err(|e| {
                DashError::Config(format!("Failed to create storage directory {}: {}", dir.display(), e))
            })?;
        }

        Ok(Self {
            upload_dir: config.upload_dir.clone(),
            output_dir: config.output_dir.clone(),
        })
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Persist an upload under a fresh identifier.
    ///
    /// Only the extension of `filename` reaches the filesystem. A stream error
    /// removes the partially written file and is returned as converted by `E`.
    pub async fn save_upload<S, E>(&self, filename: &str, stream: S) -> Result<StoredFile>
    where
        S: Stream<Item = std::result::Result<Bytes, E>>,
        E: Into<DashError>,
    {
        let file_id = Uuid::new_v4().to_string();
        let path = self.upload_dir.join(format!("{}{}", file_id, safe_extension(filename)));

        match write_stream(&path, stream).await {
            Ok(size) => {
                info!("Stored upload {} ({} bytes) at {}", filename, size, path.display());
                Ok(StoredFile {
                    file_id,
                    filename: filename.to_string(),
                    path,
                    size,
                })
            }
            Err(e) => {
                warn!("Upload of {} failed, removing partial file: {}", filename, e);
                if let Err(remove_err) = fs::remove_file(&path).await {
                    warn!("Failed to remove partial upload {}: {}", path.display(), remove_err);
                }
                Err(e)
            }
        }
    }

    /// Find the upload named `{file_id}` or `{file_id}.<ext>`.
    ///
    /// When several files match, the lexicographically smallest name wins.
    pub async fn resolve_upload(&self, file_id: &str) -> Result<PathBuf> {
        if !is_safe_name(file_id) {
            return Err(DashError::not_found());
        }

        let prefix = format!("{}.", file_id);
        let mut matches = Vec::new();
        let mut entries = fs::read_dir(&self.upload_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if (name == file_id || name.starts_with(&prefix)) && entry.file_type().await?.is_file() {
                matches.push(name);
            }
        }

        matches.sort();
        if matches.len() > 1 {
            debug!("Identifier {} matches {} uploads, using {}", file_id, matches.len(), matches[0]);
        }

        matches
            .into_iter()
            .next()
            .map(|name| self.upload_dir.join(name))
            .ok_or_else(DashError::not_found)
    }

    /// Resolve an audio track source: the literal name first, then each of
    /// [`AUDIO_EXTENSIONS`] appended in order.
    pub async fn resolve_track(&self, name: &str) -> Option<PathBuf> {
        if !is_safe_name(name) {
            return None;
        }

        let literal = self.upload_dir.join(name);
        if is_file(&literal).await {
            return Some(literal);
        }

        for ext in AUDIO_EXTENSIONS {
            let candidate = self.upload_dir.join(format!("{}.{}", name, ext));
            if is_file(&candidate).await {
                return Some(candidate);
            }
        }

        None
    }

    /// Path of an output file in the output directory
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }

    /// Open a produced file for download, returning it with its length
    pub async fn open_output(&self, file_name: &str) -> Result<(fs::File, u64)> {
        if !is_safe_name(file_name) {
            return Err(DashError::not_found());
        }

        let path = self.output_path(file_name);
        match fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => {
                let file = fs::File::open(&path).await?;
                Ok((file, metadata.len()))
            }
            _ => Err(DashError::not_found()),
        }
    }

    /// Every regular file directly inside the upload directory, sorted by name
    pub fn list_uploads(&self) -> Result<Vec<StoredEntry>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.upload_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| DashError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let metadata = entry.metadata().map_err(|e| DashError::Io(e.into()))?;
            files.push(StoredEntry {
                filename: entry.file_name().to_string_lossy().to_string(),
                size: metadata.len(),
                path: entry.path().to_path_buf(),
            });
        }

        Ok(files)
    }
}

async fn write_stream<S, E>(path: &Path, stream: S) -> Result<u64>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    E: Into<DashError>,
{
    let mut stream = std::pin::pin!(stream);
    let mut file = fs::File::create(path).await?;
    let mut size = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(Into::<DashError>::into)?;
        file.write_all(&chunk).await?;
        size += chunk.len() as u64;
    }

    file.flush().await?;
    Ok(size)
}

async fn is_file(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false)
}

/// `.ext` of an advisory filename, or nothing if it is missing or not plain ASCII alphanumerics
fn safe_extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default()
}

/// A single path component that stays inside its directory
fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains("..")
        && name != "."
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use tempfile::TempDir;

    async fn storage() -> (TempDir, Storage) {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            upload_dir: dir.path().join("uploads"),
            output_dir: dir.path().join("output"),
        };
        let storage = Storage::new(&config).await.unwrap();
        (dir, storage)
    }

    fn chunks(parts: &[&'static [u8]]) -> impl Stream<Item = std::result::Result<Bytes, std::io::Error>> {
        let items: Vec<std::result::Result<Bytes, std::io::Error>> =
            parts.iter().map(|p| Ok(Bytes::from_static(*p))).collect();
        stream::iter(items)
    }

    #[tokio::test]
    async fn test_upload_then_resolve_is_byte_identical() {
        let (_dir, storage) = storage().await;
        let stored = storage
            .save_upload("holiday.MP4", chunks(&[b"first-", b"second"]))
            .await
            .unwrap();

        assert_eq!(stored.size, 12);
        assert_eq!(stored.filename, "holiday.MP4");
        assert!(stored.path.to_string_lossy().ends_with(&format!("{}.MP4", stored.file_id)));

        let resolved = storage.resolve_upload(&stored.file_id).await.unwrap();
        assert_eq!(resolved, stored.path);
        assert_eq!(std::fs::read(resolved).unwrap(), b"first-second");
    }

    #[tokio::test]
    async fn test_upload_filename_cannot_escape_directory() {
        let (_dir, storage) = storage().await;
        let stored = storage
            .save_upload("../../etc/passwd.txt", chunks(&[b"x"]))
            .await
            .unwrap();
        assert_eq!(stored.path.parent().unwrap(), storage.upload_dir());

        let stored = storage.save_upload("weird.m p4", chunks(&[b"x"])).await.unwrap();
        assert_eq!(stored.path, storage.upload_dir().join(&stored.file_id));
    }

    #[tokio::test]
    async fn test_failed_stream_removes_partial_file() {
        let (_dir, storage) = storage().await;
        let parts: Vec<std::result::Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        ];

        let err = storage.save_upload("a.mp4", stream::iter(parts)).await.unwrap_err();
        assert!(matches!(err, DashError::Io(_)));
        assert!(storage.list_uploads().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_unknown_is_not_found() {
        let (_dir, storage) = storage().await;
        let err = storage.resolve_upload("missing").await.unwrap_err();
        assert!(matches!(err, DashError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_resolve_picks_lexicographic_first() {
        let (_dir, storage) = storage().await;
        std::fs::write(storage.upload_dir().join("clip.wav"), b"w").unwrap();
        std::fs::write(storage.upload_dir().join("clip.mp4"), b"m").unwrap();
        std::fs::write(storage.upload_dir().join("clipper.mp4"), b"c").unwrap();

        let resolved = storage.resolve_upload("clip").await.unwrap();
        assert_eq!(resolved, storage.upload_dir().join("clip.mp4"));
    }

    #[tokio::test]
    async fn test_resolve_rejects_traversal() {
        let (_dir, storage) = storage().await;
        assert!(storage.resolve_upload("../output/x").await.is_err());
        assert!(storage.resolve_upload("").await.is_err());
    }

    #[tokio::test]
    async fn test_resolve_track_extension_order() {
        let (_dir, storage) = storage().await;
        std::fs::write(storage.upload_dir().join("song.ogg"), b"o").unwrap();
        std::fs::write(storage.upload_dir().join("song.wav"), b"w").unwrap();

        assert_eq!(
            storage.resolve_track("song").await,
            Some(storage.upload_dir().join("song.wav"))
        );
        assert_eq!(
            storage.resolve_track("song.ogg").await,
            Some(storage.upload_dir().join("song.ogg"))
        );
        assert_eq!(storage.resolve_track("nothing").await, None);
    }

    #[tokio::test]
    async fn test_open_output() {
        let (_dir, storage) = storage().await;
        std::fs::write(storage.output_path("abc_cut.mp4"), b"video").unwrap();

        let (_file, len) = storage.open_output("abc_cut.mp4").await.unwrap();
        assert_eq!(len, 5);
        assert!(matches!(storage.open_output("never.mp4").await, Err(DashError::NotFound(_))));
        assert!(matches!(storage.open_output("../uploads/x").await, Err(DashError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_uploads_skips_directories() {
        let (_dir, storage) = storage().await;
        std::fs::write(storage.upload_dir().join("b.mp3"), b"12345").unwrap();
        std::fs::write(storage.upload_dir().join("a.mp4"), b"1").unwrap();
        std::fs::create_dir(storage.upload_dir().join("nested")).unwrap();

        let files = storage.list_uploads().unwrap();
        let names: Vec<_> = files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["a.mp4", "b.mp3"]);
        assert_eq!(files[1].size, 5);
    }
}
