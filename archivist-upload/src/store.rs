use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;

use crate::{types::file_name_of, CompletedPart, ObjectBody, TransferResult, UploadId};

/// The five primitives the upload engine needs from an object store.
///
/// Implementations report failures as `UploadError::Backend`; the engine
/// wraps them with the phase that failed.
#[async_trait]
pub trait ObjectBackend: Send + Sync {
    /// Store a whole object, reading the body as it is sent
    async fn put_object(&self, key: &str, body: ObjectBody) -> TransferResult<PutResult>;

    /// Open a multipart session for `key`
    async fn initiate_session(&self, key: &str) -> TransferResult<UploadId>;

    /// Upload one part and return its completion tag
    async fn upload_part(
        &self,
        key: &str,
        upload_id: &UploadId,
        part_number: u32,
        body: Bytes,
    ) -> TransferResult<String>;

    /// Assemble the object from the listed parts
    async fn complete_session(
        &self,
        key: &str,
        upload_id: &UploadId,
        parts: &[CompletedPart],
    ) -> TransferResult<PutResult>;

    /// Discard the session and every part stored under it
    async fn abort_session(&self, key: &str, upload_id: &UploadId) -> TransferResult<()>;
}

/// Result of a successful put or completion
#[derive(Debug, Clone, Default)]
pub struct PutResult {
    pub etag: Option<String>,
    pub size_bytes: Option<u64>,
}

/// Strategy for naming destination objects
pub trait KeyStrategy: Send + Sync {
    fn object_key(&self, path: &Path) -> String;
}

/// `<prefix><file name>`, e.g. `archives/backup.tar.gz`
#[derive(Debug, Clone)]
pub struct PrefixKeyStrategy {
    prefix: String,
}

impl PrefixKeyStrategy {
    pub fn new<S: Into<String>>(prefix: S) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for PrefixKeyStrategy {
    fn default() -> Self {
        Self::new("archives/")
    }
}

impl KeyStrategy for PrefixKeyStrategy {
    fn object_key(&self, path: &Path) -> String {
        format!("{}{}", self.prefix, file_name_of(path))
    }
}
