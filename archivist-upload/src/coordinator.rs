use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::{
    classify::part_count, progress::percent, CompletedPart, ObjectBackend, PartStreamer,
    ProgressReporter, PutResult, TransferResult, UploadConfig, UploadError, UploadId,
    UploadRequest,
};

/// Where a multipart session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Open,
    Uploading,
    Completing,
    Completed,
    Aborted,
    /// The complete call failed; the session was left for the backend to reconcile
    CompletionFailed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Completed | SessionState::Aborted | SessionState::CompletionFailed
        )
    }
}

/// One backend session and the parts it has acknowledged so far
#[derive(Debug, Clone)]
pub struct MultipartSession {
    pub key: String,
    pub upload_id: UploadId,
    pub parts: Vec<CompletedPart>,
    pub state: SessionState,
}

impl MultipartSession {
    fn open(key: &str, upload_id: UploadId) -> Self {
        Self {
            key: key.to_string(),
            upload_id,
            parts: Vec::new(),
            state: SessionState::Open,
        }
    }

    /// Part numbers are 1-based and follow the recorded parts without gaps
    pub fn next_part_number(&self) -> u32 {
        self.parts.len() as u32 + 1
    }

    fn record_part(&mut self, etag: String) {
        let part_number = self.next_part_number();
        self.parts.push(CompletedPart { part_number, etag });
    }

    fn transition(&mut self, next: SessionState) {
        debug!(upload_id = %self.upload_id, from = ?self.state, to = ?next, "session state");
        self.state = next;
    }
}

/// Outcome of a completed multipart transfer
#[derive(Debug, Clone)]
pub struct MultipartReceipt {
    pub session: MultipartSession,
    pub bytes_sent: u64,
    pub put: PutResult,
}

/// Runs the initiate / upload parts / complete-or-abort protocol for one file.
///
/// Parts go out one at a time; each is acknowledged before the next chunk is read.
///
/// Failure policy:
/// - initiate fails: nothing to clean up, the error is returned as is.
/// - a part fails (or the source runs short): the session is aborted and no
///   further parts are sent. If the abort itself fails it is logged and the
///   part error is still what the caller sees.
/// - complete fails: the error is returned and no abort is issued; the
///   backend owns reconciliation of the unfinished session.
pub struct MultipartCoordinator<'a, B: ObjectBackend + ?Sized> {
    backend: &'a B,
    config: &'a UploadConfig,
}

impl<'a, B: ObjectBackend + ?Sized> MultipartCoordinator<'a, B> {
    pub fn new(backend: &'a B, config: &'a UploadConfig) -> Self {
        Self { backend, config }
    }

    #[instrument(skip_all, fields(key = request.key(), size = request.size_bytes()))]
    pub async fn upload(
        &self,
        request: &UploadRequest,
        progress: &dyn ProgressReporter,
    ) -> TransferResult<MultipartReceipt> {
        let part_size = usize::try_from(self.config.part_size)
            .map_err(|_| UploadError::invalid("part size does not fit in memory"))?;
        if part_size == 0 {
            return Err(UploadError::invalid("part size must be greater than zero"));
        }

        let expected_parts = part_count(request.size_bytes(), self.config.part_size);
        if expected_parts > u64::from(self.config.max_parts) {
            return Err(UploadError::invalid(format!(
                "{} bytes needs {} parts of {} bytes, more than the limit of {}",
                request.size_bytes(),
                expected_parts,
                self.config.part_size,
                self.config.max_parts
            )));
        }

        let upload_id = self
            .backend
            .initiate_session(request.key())
            .await
            .map_err(|e| UploadError::session_init(request.key(), e))?;
        let mut session = MultipartSession::open(request.key(), upload_id);
        info!(upload_id = %session.upload_id, parts = expected_parts, "multipart session opened");

        let sent = self.upload_parts(request, &mut session, part_size, progress).await;
        progress.clear();

        let bytes_sent = match sent {
            Ok(bytes_sent) => bytes_sent,
            Err(e) => {
                self.abort(&mut session).await;
                return Err(e);
            }
        };

        session.transition(SessionState::Completing);
        match self
            .backend
            .complete_session(&session.key, &session.upload_id, &session.parts)
            .await
        {
            Ok(put) => {
                session.transition(SessionState::Completed);
                info!(upload_id = %session.upload_id, parts = session.parts.len(), "multipart upload completed");
                Ok(MultipartReceipt {
                    session,
                    bytes_sent,
                    put,
                })
            }
            Err(e) => {
                session.transition(SessionState::CompletionFailed);
                Err(UploadError::completion(session.upload_id, e))
            }
        }
    }

    /// Send every part. The source file is closed when this returns.
    async fn upload_parts(
        &self,
        request: &UploadRequest,
        session: &mut MultipartSession,
        part_size: usize,
        progress: &dyn ProgressReporter,
    ) -> TransferResult<u64> {
        let total = request.size_bytes();
        let mut parts = PartStreamer::open(request.path(), total, part_size).await?;
        let mut transferred = 0u64;

        session.transition(SessionState::Uploading);
        progress.update(percent(transferred, total));

        while transferred < total {
            let part_number = session.next_part_number();
            let body = match parts.next_chunk().await {
                Ok(Some(chunk)) if !chunk.is_empty() => chunk,
                Ok(_) => {
                    return Err(UploadError::part_upload(
                        part_number,
                        UploadError::SourceTruncated {
                            expected: total,
                            read: transferred,
                        },
                    ));
                }
                Err(e) => return Err(UploadError::part_upload(part_number, e)),
            };
            let len = body.len() as u64;

            let etag = self
                .backend
                .upload_part(&session.key, &session.upload_id, part_number, body)
                .await
                .map_err(|e| UploadError::part_upload(part_number, e))?;
            debug!(part_number, bytes = len, "part uploaded");

            session.record_part(etag);
            transferred += len;
            progress.update(percent(transferred, total));
        }

        Ok(transferred)
    }

    async fn abort(&self, session: &mut MultipartSession) {
        match self
            .backend
            .abort_session(&session.key, &session.upload_id)
            .await
        {
            Ok(()) => info!(upload_id = %session.upload_id, "multipart upload aborted"),
            Err(e) => {
                let err = UploadError::abort(session.upload_id.clone(), e);
                warn!(error = %err, "abort failed, parts may remain on the backend");
            }
        }
        session.transition(SessionState::Aborted);
    }
}
