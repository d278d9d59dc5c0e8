use bytes::Bytes;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use crate::{Strategy, TransferResult, UploadError};

/// Stream of bytes for object bodies
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// An opened source file and its measured length, handed to a single put.
///
/// Backends read it incrementally; the body is never buffered whole. The
/// path is kept so a backend can reopen the file to resend it.
#[derive(Debug)]
pub struct ObjectBody {
    file: tokio::fs::File,
    path: PathBuf,
    size_bytes: u64,
}

impl ObjectBody {
    pub fn new(file: tokio::fs::File, path: impl Into<PathBuf>, size_bytes: u64) -> Self {
        Self {
            file,
            path: path.into(),
            size_bytes,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Length announced to the backend
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Read the file as a chunked stream
    pub fn into_stream(self) -> ByteStream {
        Box::pin(ReaderStream::new(self.file))
    }
}

/// Identifier of a multipart session, issued by the backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UploadId(pub String);

impl UploadId {
    /// Generate a new random upload ID
    pub fn new() -> Self {
        Self(format!("upl_{}", Uuid::new_v4().simple()))
    }

    /// Create from existing string
    pub fn from_string(id: String) -> Self {
        Self(id)
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for UploadId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UploadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A part the backend has acknowledged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedPart {
    pub part_number: u32,
    pub etag: String,
}

/// A local file bound for a destination key.
///
/// The size is measured once, here, and never re-read during the transfer.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    path: PathBuf,
    key: String,
    size_bytes: u64,
}

impl UploadRequest {
    /// Check the file exists and measure it
    pub async fn from_path<P, K>(path: P, key: K) -> TransferResult<Self>
    where
        P: Into<PathBuf>,
        K: Into<String>,
    {
        let path = path.into();
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(UploadError::source_not_found(path));
        }

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) => return Err(UploadError::source_unreadable(path, e)),
        };
        if !metadata.is_file() {
            return Err(UploadError::source_unreadable(
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
            ));
        }

        Ok(Self {
            path,
            key: key.into(),
            size_bytes: metadata.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Last path component, used for display
    pub fn file_name(&self) -> String {
        file_name_of(&self.path)
    }
}

pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Outcome of one file's transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResult {
    /// Local path as given by the caller
    pub path: PathBuf,
    pub file_name: String,
    pub key: String,
    pub success: bool,
    /// `None` when the transfer never got as far as classification
    pub strategy: Option<Strategy>,
    pub size_bytes: u64,
    pub size_display: String,
    pub elapsed_ms: f64,
    /// Parts committed by a successful multipart transfer
    pub parts: u32,
    /// Human-readable reason when `success` is false
    pub error: Option<String>,
    pub completed_at: i64,
}

impl UploadResult {
    pub fn is_success(&self) -> bool {
        self.success
    }
}
