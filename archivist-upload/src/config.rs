use std::env;

use crate::{TransferResult, UploadError};

/// Default size at or above which the multipart path is taken (100MB)
pub const DEFAULT_SIZE_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Default part size for multipart uploads (64MB)
pub const DEFAULT_PART_SIZE: u64 = 64 * 1024 * 1024;

/// S3 refuses sessions with more parts than this
pub const DEFAULT_MAX_PARTS: u32 = 10_000;

/// Configuration for upload operations
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Bucket (or container) objects are written to
    pub container: String,

    /// Region the backend client is pinned to
    pub region: String,

    /// Files smaller than this go through a single put; everything else is multipart
    pub size_threshold: u64,

    /// Bytes per part. Every part but the last is exactly this long.
    pub part_size: u64,

    /// Upper bound on parts per session
    pub max_parts: u32,

    /// Optional endpoint for S3-compatible stores (MinIO, RustFS, ...)
    pub endpoint_url: Option<String>,

    /// Prepended to the file name to form the destination key
    pub key_prefix: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            container: String::new(),
            region: "us-east-1".to_string(),
            size_threshold: DEFAULT_SIZE_THRESHOLD,
            part_size: DEFAULT_PART_SIZE,
            max_parts: DEFAULT_MAX_PARTS,
            endpoint_url: None,
            key_prefix: "archives/".to_string(),
        }
    }
}

impl UploadConfig {
    /// Create a new config with defaults
    pub fn new<S: Into<String>>(container: S) -> Self {
        Self {
            container: container.into(),
            ..Self::default()
        }
    }

    /// Build a config from `ARCHIVIST_*` environment variables.
    ///
    /// Unset variables keep their defaults; set but unparsable numbers are an error.
    pub fn from_env() -> TransferResult<Self> {
        let mut config = Self::default();

        if let Some(container) = read_env("ARCHIVIST_BUCKET") {
            config.container = container;
        }
        if let Some(region) = read_env("ARCHIVIST_REGION") {
            config.region = region;
        }
        if let Some(endpoint) = read_env("ARCHIVIST_ENDPOINT_URL") {
            config.endpoint_url = Some(endpoint);
        }
        // An empty prefix is meaningful here (keys at the bucket root)
        if let Ok(prefix) = env::var("ARCHIVIST_KEY_PREFIX") {
            config.key_prefix = prefix;
        }
        if let Some(threshold) = read_env_u64("ARCHIVIST_THRESHOLD_BYTES")? {
            config.size_threshold = threshold;
        }
        if let Some(part_size) = read_env_u64("ARCHIVIST_PART_SIZE_BYTES")? {
            config.part_size = part_size;
        }

        Ok(config)
    }

    pub fn with_container<S: Into<String>>(mut self, container: S) -> Self {
        self.container = container.into();
        self
    }

    pub fn with_region<S: Into<String>>(mut self, region: S) -> Self {
        self.region = region.into();
        self
    }

    /// Set multipart threshold
    pub fn with_size_threshold(mut self, bytes: u64) -> Self {
        self.size_threshold = bytes;
        self
    }

    /// Set part size
    pub fn with_part_size(mut self, bytes: u64) -> Self {
        self.part_size = bytes;
        self
    }

    /// Set max parts
    pub fn with_max_parts(mut self, max: u32) -> Self {
        self.max_parts = max;
        self
    }

    pub fn with_endpoint_url<S: Into<String>>(mut self, url: S) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }

    pub fn with_key_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> TransferResult<()> {
        if self.container.trim().is_empty() {
            return Err(UploadError::invalid("container name is required"));
        }
        if self.size_threshold == 0 {
            return Err(UploadError::invalid("size threshold must be greater than zero"));
        }
        if self.part_size == 0 {
            return Err(UploadError::invalid("part size must be greater than zero"));
        }
        if usize::try_from(self.part_size).is_err() {
            return Err(UploadError::invalid(format!(
                "part size {} does not fit in memory on this platform",
                self.part_size
            )));
        }
        if self.max_parts == 0 {
            return Err(UploadError::invalid("max parts must be greater than zero"));
        }
        Ok(())
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn read_env_u64(key: &str) -> TransferResult<Option<u64>> {
    read_env(key)
        .map(|value| {
            value.trim().parse::<u64>().map_err(|_| {
                UploadError::invalid(format!("{} must be a byte count, got {:?}", key, value))
            })
        })
        .transpose()
}
