use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::{
    CompletedPart, ObjectBackend, ObjectBody, PutResult, TransferResult, UploadError, UploadId,
};

/// A backend call, as observed by [`MemoryStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    PutObject { key: String, size_bytes: u64 },
    InitiateSession { key: String },
    UploadPart { upload_id: UploadId, part_number: u32, size_bytes: u64 },
    CompleteSession { upload_id: UploadId, parts: Vec<u32> },
    AbortSession { upload_id: UploadId },
}

#[derive(Debug)]
struct PendingSession {
    key: String,
    parts: BTreeMap<u32, (String, Bytes)>,
}

#[derive(Debug, Default)]
struct Failures {
    put: bool,
    initiate: bool,
    parts: HashSet<u32>,
    complete: bool,
    abort: bool,
}

#[derive(Debug, Default)]
struct State {
    objects: HashMap<String, Bytes>,
    sessions: HashMap<UploadId, PendingSession>,
    calls: Vec<BackendCall>,
    failures: Failures,
}

/// In-memory object store that records every call.
///
/// Objects only become visible through a put or a successful completion, so
/// tests can check that aborted or unfinished sessions leave nothing behind.
/// Individual primitives can be set to fail.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

#[derive(Debug, thiserror::Error)]
#[error("injected {0} failure")]
struct InjectedFailure(&'static str);

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_put(self) -> Self {
        self.state.lock().failures.put = true;
        self
    }

    pub fn fail_initiate(self) -> Self {
        self.state.lock().failures.initiate = true;
        self
    }

    /// Fail the upload of part `part_number`
    pub fn fail_part(self, part_number: u32) -> Self {
        self.state.lock().failures.parts.insert(part_number);
        self
    }

    pub fn fail_complete(self) -> Self {
        self.state.lock().failures.complete = true;
        self
    }

    pub fn fail_abort(self) -> Self {
        self.state.lock().failures.abort = true;
        self
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<BackendCall> {
        self.state.lock().calls.clone()
    }

    /// Body of a visible object
    pub fn object(&self, key: &str) -> Option<Bytes> {
        self.state.lock().objects.get(key).cloned()
    }

    /// Sessions neither completed nor aborted
    pub fn open_sessions(&self) -> usize {
        self.state.lock().sessions.len()
    }

    fn injected(what: &'static str) -> UploadError {
        UploadError::backend(InjectedFailure(what))
    }
}

#[async_trait]
impl ObjectBackend for MemoryStore {
    async fn put_object(&self, key: &str, body: ObjectBody) -> TransferResult<PutResult> {
        let mut body = body.into_stream();
        let mut data = BytesMut::new();
        while let Some(chunk) = body.next().await {
            data.extend_from_slice(&chunk?);
        }
        let data = data.freeze();
        let size_bytes = data.len() as u64;

        let mut state = self.state.lock();
        state.calls.push(BackendCall::PutObject {
            key: key.to_string(),
            size_bytes,
        });
        if state.failures.put {
            return Err(Self::injected("put"));
        }
        state.objects.insert(key.to_string(), data);

        Ok(PutResult {
            etag: Some(format!("\"{}\"", uuid::Uuid::new_v4().simple())),
            size_bytes: Some(size_bytes),
        })
    }

    async fn initiate_session(&self, key: &str) -> TransferResult<UploadId> {
        let mut state = self.state.lock();
        state.calls.push(BackendCall::InitiateSession {
            key: key.to_string(),
        });
        if state.failures.initiate {
            return Err(Self::injected("initiate"));
        }

        let upload_id = UploadId::new();
        state.sessions.insert(
            upload_id.clone(),
            PendingSession {
                key: key.to_string(),
                parts: BTreeMap::new(),
            },
        );
        Ok(upload_id)
    }

    async fn upload_part(
        &self,
        key: &str,
        upload_id: &UploadId,
        part_number: u32,
        body: Bytes,
    ) -> TransferResult<String> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.calls.push(BackendCall::UploadPart {
            upload_id: upload_id.clone(),
            part_number,
            size_bytes: body.len() as u64,
        });
        if state.failures.parts.contains(&part_number) {
            return Err(Self::injected("part"));
        }

        let session = state
            .sessions
            .get_mut(upload_id)
            .filter(|session| session.key == key)
            .ok_or_else(|| UploadError::invalid(format!("no open session {}", upload_id)))?;
        let etag = format!("\"{}\"", uuid::Uuid::new_v4().simple());
        session.parts.insert(part_number, (etag.clone(), body));
        Ok(etag)
    }

    async fn complete_session(
        &self,
        key: &str,
        upload_id: &UploadId,
        parts: &[CompletedPart],
    ) -> TransferResult<PutResult> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.calls.push(BackendCall::CompleteSession {
            upload_id: upload_id.clone(),
            parts: parts.iter().map(|p| p.part_number).collect(),
        });
        if state.failures.complete {
            return Err(Self::injected("complete"));
        }

        let session = state
            .sessions
            .get(upload_id)
            .filter(|session| session.key == key)
            .ok_or_else(|| UploadError::invalid(format!("no open session {}", upload_id)))?;

        let mut data = BytesMut::new();
        for (expected, part) in (1u32..).zip(parts) {
            if part.part_number != expected {
                return Err(UploadError::invalid(format!(
                    "parts out of order: expected {}, got {}",
                    expected, part.part_number
                )));
            }
            match session.parts.get(&part.part_number) {
                Some((etag, body)) if *etag == part.etag => data.extend_from_slice(body),
                _ => {
                    return Err(UploadError::invalid(format!(
                        "part {} does not match an uploaded part",
                        part.part_number
                    )))
                }
            }
        }

        let data = data.freeze();
        let size_bytes = data.len() as u64;
        state.sessions.remove(upload_id);
        state.objects.insert(key.to_string(), data);

        Ok(PutResult {
            etag: Some(format!("\"{}-{}\"", uuid::Uuid::new_v4().simple(), parts.len())),
            size_bytes: Some(size_bytes),
        })
    }

    async fn abort_session(&self, _key: &str, upload_id: &UploadId) -> TransferResult<()> {
        let mut state = self.state.lock();
        state.calls.push(BackendCall::AbortSession {
            upload_id: upload_id.clone(),
        });
        if state.failures.abort {
            return Err(Self::injected("abort"));
        }
        state
            .sessions
            .remove(upload_id)
            .map(|_| ())
            .ok_or_else(|| UploadError::invalid(format!("no open session {}", upload_id)))
    }
}
