use tracing::debug;

use crate::{ObjectBackend, ObjectBody, PutResult, TransferResult, UploadError, UploadRequest};

/// Sends a whole file in one put
pub struct SingleShotUploader<'a, B: ObjectBackend + ?Sized> {
    backend: &'a B,
}

impl<'a, B: ObjectBackend + ?Sized> SingleShotUploader<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Open the source and stream it to `request.key()`.
    ///
    /// If the file cannot be opened no backend call is made.
    pub async fn upload(&self, request: &UploadRequest) -> TransferResult<PutResult> {
        let file = tokio::fs::File::open(request.path())
            .await
            .map_err(|e| UploadError::source_unreadable(request.path(), e))?;

        debug!(key = request.key(), size = request.size_bytes(), "put object");

        let body = ObjectBody::new(file, request.path(), request.size_bytes());
        self.backend
            .put_object(request.key(), body)
            .await
            .map_err(|e| UploadError::put_object(request.key(), e))
    }
}
