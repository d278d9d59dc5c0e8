use bytes::{Bytes, BytesMut};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::{TransferResult, UploadError};

/// Reads a file front to back in `part_size` chunks through one reused buffer.
///
/// Each chunk is split off the buffer without copying. Once the caller drops
/// it, the next read reclaims the same allocation, so a transfer holds about
/// one part in memory. A chunk still referenced elsewhere forces a fresh
/// allocation for the next one.
pub struct PartStreamer {
    file: File,
    buffer: BytesMut,
    part_size: usize,
    remaining: u64,
}

impl PartStreamer {
    /// Open `path` expecting `size_bytes` bytes
    pub async fn open(path: &Path, size_bytes: u64, part_size: usize) -> TransferResult<Self> {
        let file = File::open(path)
            .await
            .map_err(|e| UploadError::source_unreadable(path, e))?;

        Ok(Self {
            file,
            buffer: BytesMut::with_capacity(part_size),
            part_size,
            remaining: size_bytes,
        })
    }

    /// Bytes not yet handed out
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Read the next chunk of `min(part_size, remaining)` bytes.
    ///
    /// Returns `None` once the expected size has been consumed. A chunk may be
    /// shorter than requested if the file ends early; its length is what was
    /// actually read. An empty read while bytes remain yields an empty chunk.
    pub async fn next_chunk(&mut self) -> TransferResult<Option<Bytes>> {
        if self.remaining == 0 {
            return Ok(None);
        }

        let wanted = self.part_size.min(usize::try_from(self.remaining).unwrap_or(usize::MAX));
        self.buffer.reserve(wanted);
        self.buffer.resize(wanted, 0);

        let mut filled = 0;
        while filled < wanted {
            let n = self.file.read(&mut self.buffer[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        self.buffer.truncate(filled);
        self.remaining -= filled as u64;
        Ok(Some(self.buffer.split().freeze()))
    }
}
