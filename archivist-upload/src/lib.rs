//! # archivist-upload: chunked uploads to object storage
//!
//! `archivist-upload` moves local files (typically backup tarballs) into an
//! object store. Small files go up in a single put; anything at or above the
//! configured threshold is sent as a multipart session that either completes
//! or is aborted, so a failed transfer never leaves a partial object behind.
//!
//! ## Quick Start
//!
//! ```no_run
//! use archivist_upload::prelude::*;
//! use std::path::Path;
//!
//! # #[tokio::main]
//! # async fn main() -> TransferResult<()> {
//! let config = UploadConfig::new("my-bucket").with_region("us-east-1");
//! let store = S3Store::from_config(&config).await?;
//! let uploader = Uploader::new(store, config)?;
//!
//! let result = uploader.upload_path(Path::new("/backups/site.tar.gz")).await;
//! println!("{} -> {} in {:.2}ms", result.file_name, result.key, result.elapsed_ms);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │   Uploader           │  ← classify, time, report
//! ├──────────┬───────────┤
//! │ Single   │ Multipart │  ← one put | initiate → parts → complete/abort
//! ├──────────┴───────────┤
//! │   ObjectBackend      │  ← S3Store, MemoryStore, your own
//! └──────────────────────┘
//! ```
//!
//! Transfers are sequential: each part is acknowledged before the next chunk
//! is read, and the engine never retries on its own.

mod classify;
mod config;
mod coordinator;
mod error;
mod format;
pub mod memory_store;
mod parts;
pub mod progress;
mod s3_store;
pub mod store;
mod single;
mod timer;
mod types;
mod uploader;

pub use classify::{part_count, Strategy};
pub use config::{UploadConfig, DEFAULT_MAX_PARTS, DEFAULT_PART_SIZE, DEFAULT_SIZE_THRESHOLD};
pub use coordinator::{MultipartCoordinator, MultipartReceipt, MultipartSession, SessionState};
pub use error::{TransferResult, UploadError};
pub use format::format_size;
pub use memory_store::{BackendCall, MemoryStore};
pub use parts::PartStreamer;
pub use progress::{percent, NoProgress, ProgressReporter, RecordingProgress};
pub use s3_store::S3Store;
pub use single::SingleShotUploader;
pub use store::{KeyStrategy, ObjectBackend, PrefixKeyStrategy, PutResult};
pub use timer::TransferTimer;
pub use types::{ByteStream, CompletedPart, ObjectBody, UploadId, UploadRequest, UploadResult};
pub use uploader::Uploader;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        ObjectBackend, ProgressReporter, S3Store, TransferResult, UploadConfig, UploadError,
        UploadResult, Uploader,
    };
}
