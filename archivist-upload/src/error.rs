use std::path::PathBuf;
use thiserror::Error;

use crate::UploadId;

/// Result type for upload operations
pub type TransferResult<T> = Result<T, UploadError>;

/// Errors that can end a transfer
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("File not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("Failed to open {}: {source}", path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Source ended after {read} of {expected} bytes")]
    SourceTruncated { expected: u64, read: u64 },

    #[error("Failed to upload object {key}: {source}")]
    PutObject {
        key: String,
        #[source]
        source: Box<UploadError>,
    },

    #[error("Failed to initiate multipart upload for {key}: {source}")]
    SessionInit {
        key: String,
        #[source]
        source: Box<UploadError>,
    },

    #[error("Failed to upload part {part_number}: {source}")]
    PartUpload {
        part_number: u32,
        #[source]
        source: Box<UploadError>,
    },

    #[error("Failed to complete multipart upload {upload_id}: {source}")]
    Completion {
        upload_id: UploadId,
        #[source]
        source: Box<UploadError>,
    },

    #[error("Failed to abort multipart upload {upload_id}: {source}")]
    Abort {
        upload_id: UploadId,
        #[source]
        source: Box<UploadError>,
    },

    #[error("Invalid request: {message}")]
    Invalid { message: String },

    #[error("Storage backend error: {source}")]
    Backend {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl UploadError {
    /// Create a backend error from any error type
    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            source: Box::new(error),
        }
    }

    /// Create an invalid request error
    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    pub fn source_not_found<P: Into<PathBuf>>(path: P) -> Self {
        Self::SourceNotFound { path: path.into() }
    }

    pub fn source_unreadable<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::SourceUnreadable {
            path: path.into(),
            source,
        }
    }

    pub fn put_object<S: Into<String>>(key: S, source: UploadError) -> Self {
        Self::PutObject {
            key: key.into(),
            source: Box::new(source),
        }
    }

    pub fn session_init<S: Into<String>>(key: S, source: UploadError) -> Self {
        Self::SessionInit {
            key: key.into(),
            source: Box::new(source),
        }
    }

    pub fn part_upload(part_number: u32, source: UploadError) -> Self {
        Self::PartUpload {
            part_number,
            source: Box::new(source),
        }
    }

    pub fn completion(upload_id: UploadId, source: UploadError) -> Self {
        Self::Completion {
            upload_id,
            source: Box::new(source),
        }
    }

    pub fn abort(upload_id: UploadId, source: UploadError) -> Self {
        Self::Abort {
            upload_id,
            source: Box::new(source),
        }
    }
}
