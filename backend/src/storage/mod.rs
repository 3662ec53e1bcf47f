//! Local filesystem storage for uploaded files
//!
//! Files live under `<upload_dir>/user_files/<user uuid>/` and are named
//! `<file uuid>_<original name>`. Only the path relative to the upload root
//! is persisted, so the root can move without rewriting records.

use anyhow::Result;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

const USER_FILES_DIR: &str = "user_files";
const FALLBACK_NAME: &str = "file";

/// Failure while receiving an upload
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("File size exceeds the {} limit", describe_size(*.limit))]
    TooLarge { limit: u64 },

    #[error("Storage I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Uploaded file storage rooted at a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
    max_file_size: u64,
}

/// A file that has been fully written to disk
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    pub file_uuid: Uuid,
    /// Name on disk: `<file uuid>_<original name>`
    pub filename: String,
    /// Path relative to the storage root
    pub relative_path: String,
    pub size: u64,
}

/// An upload being streamed to disk
///
/// Call [`finish`](Self::finish) on success or [`abort`](Self::abort) on any
/// failure; aborting removes the partial file.
pub struct PendingUpload {
    file: fs::File,
    absolute_path: PathBuf,
    stored: StoredFile,
    limit: u64,
}

impl PendingUpload {
    /// Append a chunk, enforcing the size limit
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), UploadError> {
        let size = self.stored.size + chunk.len() as u64;
        if size > self.limit {
            return Err(UploadError::TooLarge { limit: self.limit });
        }
        self.file.write_all(chunk).await?;
        self.stored.size = size;
        Ok(())
    }

    /// Flush to disk and return the stored file
    pub async fn finish(mut self) -> Result<StoredFile, UploadError> {
        self.file.flush().await?;
        self.file.sync_all().await?;
        debug!(path = %self.stored.relative_path, bytes = self.stored.size, "Stored upload");
        Ok(self.stored)
    }

    /// Discard the partial file
    pub async fn abort(self) {
        drop(self.file);
        if let Err(e) = fs::remove_file(&self.absolute_path).await {
            warn!(path = %self.absolute_path.display(), error = %e, "Failed to remove partial upload");
        }
    }
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>, max_file_size: u64) -> Self {
        Self {
            root: root.into(),
            max_file_size,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Create the storage root if it does not exist yet
    pub async fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await.map_err(|e| {
            anyhow::anyhow!("Failed to create storage root {}: {}", self.root.display(), e)
        })
    }

    /// Start writing a new upload for `user_uuid`
    pub async fn begin_upload(
        &self,
        user_uuid: Uuid,
        original_name: &str,
    ) -> Result<PendingUpload, UploadError> {
        let file_uuid = Uuid::new_v4();
        let filename = format!("{}_{}", file_uuid, sanitize_filename(original_name));
        let relative_path = format!("{}/{}/{}", USER_FILES_DIR, user_uuid, filename);

        let absolute_path = self.root.join(&relative_path);
        if let Some(parent) = absolute_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let file = fs::File::create(&absolute_path).await?;

        Ok(PendingUpload {
            file,
            absolute_path,
            stored: StoredFile {
                file_uuid,
                filename,
                relative_path,
                size: 0,
            },
            limit: self.max_file_size,
        })
    }

    /// Open a stored file for reading
    ///
    /// Returns `None` when the file is missing on disk or the stored path
    /// would escape the storage root.
    pub async fn open(&self, relative_path: &str) -> Result<Option<(fs::File, u64)>> {
        let Some(path) = self.resolve(relative_path) else {
            warn!(path = relative_path, "Rejected stored path outside storage root");
            return Ok(None);
        };

        match fs::File::open(&path).await {
            Ok(file) => {
                let metadata = file.metadata().await?;
                if !metadata.is_file() {
                    return Ok(None);
                }
                Ok(Some((file, metadata.len())))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(anyhow::anyhow!("Failed to open {}: {}", relative_path, e)),
        }
    }

    /// Remove a stored file, logging rather than failing if it is gone
    pub async fn remove(&self, relative_path: &str) {
        let Some(path) = self.resolve(relative_path) else {
            return;
        };
        if let Err(e) = fs::remove_file(&path).await {
            warn!(path = relative_path, error = %e, "Failed to remove stored file");
        }
    }

    fn resolve(&self, relative_path: &str) -> Option<PathBuf> {
        let relative = Path::new(relative_path);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        safe.then(|| self.root.join(relative))
    }
}

/// Human-readable size, in whole MB when it divides evenly
pub fn describe_size(bytes: u64) -> String {
    const MB: u64 = 1024 * 1024;
    if bytes >= MB && bytes % MB == 0 {
        format!("{}MB", bytes / MB)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Reduce a client-supplied name to a single safe path segment
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control() && *c != '"')
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        FALLBACK_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Recover the client-facing name from a stored `<uuid>_<name>` filename
pub fn original_name(stored_filename: &str) -> &str {
    match stored_filename.split_once('_') {
        Some((_, name)) if !name.is_empty() => name,
        _ => stored_filename,
    }
}
