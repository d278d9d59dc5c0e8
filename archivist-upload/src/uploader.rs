use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    format_size, types::file_name_of, KeyStrategy, MultipartCoordinator, NoProgress,
    ObjectBackend, PrefixKeyStrategy, ProgressReporter, SingleShotUploader, Strategy,
    TransferResult, TransferTimer, UploadConfig, UploadRequest, UploadResult,
};

/// Entry point: picks a strategy per file, times it, and reports the outcome.
///
/// Each call is an independent transfer; a failed file leaves the uploader
/// ready for the next one.
pub struct Uploader {
    backend: Arc<dyn ObjectBackend>,
    keys: Arc<dyn KeyStrategy>,
    config: UploadConfig,
}

impl Uploader {
    /// Create an uploader. Keys are `config.key_prefix` + file name.
    pub fn new<B: ObjectBackend + 'static>(backend: B, config: UploadConfig) -> TransferResult<Self> {
        Self::from_arc(Arc::new(backend), config)
    }

    /// Create an uploader around a shared backend
    pub fn from_arc(backend: Arc<dyn ObjectBackend>, config: UploadConfig) -> TransferResult<Self> {
        config.validate()?;
        Ok(Self {
            backend,
            keys: Arc::new(PrefixKeyStrategy::new(config.key_prefix.clone())),
            config,
        })
    }

    /// Replace the key strategy
    pub fn with_key_strategy<K: KeyStrategy + 'static>(mut self, keys: K) -> Self {
        self.keys = Arc::new(keys);
        self
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Destination key for a local path
    pub fn object_key(&self, path: &Path) -> String {
        self.keys.object_key(path)
    }

    /// Upload `path` under its derived key without progress output
    pub async fn upload_path(&self, path: &Path) -> UploadResult {
        self.upload_path_with_progress(path, &NoProgress).await
    }

    /// Upload `path` under its derived key.
    ///
    /// Never fails: every error is folded into the returned result.
    pub async fn upload_path_with_progress(
        &self,
        path: &Path,
        progress: &dyn ProgressReporter,
    ) -> UploadResult {
        let key = self.object_key(path);
        match UploadRequest::from_path(path, key.clone()).await {
            Ok(request) => self.upload(&request, progress).await,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "upload rejected");
                UploadResult {
                    path: path.to_path_buf(),
                    file_name: file_name_of(path),
                    key,
                    success: false,
                    strategy: None,
                    size_bytes: 0,
                    size_display: format_size(0),
                    elapsed_ms: 0.0,
                    parts: 0,
                    error: Some(e.to_string()),
                    completed_at: chrono::Utc::now().timestamp(),
                }
            }
        }
    }

    /// Transfer a measured request
    pub async fn upload(
        &self,
        request: &UploadRequest,
        progress: &dyn ProgressReporter,
    ) -> UploadResult {
        let strategy = Strategy::for_size(request.size_bytes(), self.config.size_threshold);
        info!(
            path = %request.path().display(),
            key = request.key(),
            size = request.size_bytes(),
            ?strategy,
            "uploading"
        );

        let timer = TransferTimer::start();
        let outcome = self.dispatch(strategy, request, progress).await;
        let elapsed_ms = timer.elapsed_ms();

        let (success, parts, error) = match outcome {
            Ok(parts) => {
                info!(key = request.key(), elapsed_ms, "upload succeeded");
                (true, parts, None)
            }
            Err(e) => {
                warn!(key = request.key(), elapsed_ms, error = %e, "upload failed");
                (false, 0, Some(e.to_string()))
            }
        };

        UploadResult {
            path: request.path().to_path_buf(),
            file_name: request.file_name(),
            key: request.key().to_string(),
            success,
            strategy: Some(strategy),
            size_bytes: request.size_bytes(),
            size_display: format_size(request.size_bytes()),
            elapsed_ms,
            parts,
            error,
            completed_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Run the chosen strategy; returns the number of parts committed
    async fn dispatch(
        &self,
        strategy: Strategy,
        request: &UploadRequest,
        progress: &dyn ProgressReporter,
    ) -> TransferResult<u32> {
        match strategy {
            Strategy::SingleShot => {
                SingleShotUploader::new(self.backend.as_ref())
                    .upload(request)
                    .await?;
                Ok(0)
            }
            Strategy::Multipart => {
                let receipt = MultipartCoordinator::new(self.backend.as_ref(), &self.config)
                    .upload(request, progress)
                    .await?;
                Ok(receipt.session.parts.len() as u32)
            }
        }
    }
}
