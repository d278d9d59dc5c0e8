use std::path::PathBuf;

use anyhow::Result;
use archivist_upload::UploadConfig;
use clap::Parser;

/// Upload files to S3-compatible object storage
#[derive(Parser, Debug)]
#[command(name = "archivist", version, about)]
pub struct Cli {
    /// Files to upload; each is transferred independently
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Destination bucket
    #[arg(long, short, env = "ARCHIVIST_BUCKET")]
    pub bucket: Option<String>,

    /// Backend region
    #[arg(long, env = "ARCHIVIST_REGION")]
    pub region: Option<String>,

    /// Endpoint of an S3-compatible store
    #[arg(long, env = "ARCHIVIST_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    /// Prefix for destination keys
    #[arg(long, env = "ARCHIVIST_KEY_PREFIX")]
    pub prefix: Option<String>,

    /// Files at or above this many bytes use multipart upload
    #[arg(long, env = "ARCHIVIST_THRESHOLD_BYTES")]
    pub threshold: Option<u64>,

    /// Bytes per multipart part
    #[arg(long, env = "ARCHIVIST_PART_SIZE_BYTES")]
    pub part_size: Option<u64>,

    /// Print one JSON object per file instead of the table
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Defaults, then environment, then flags
    pub fn upload_config(&self) -> Result<UploadConfig> {
        self.apply(UploadConfig::from_env()?)
    }

    /// Layer the flags over `config` and validate the result
    fn apply(&self, mut config: UploadConfig) -> Result<UploadConfig> {
        if let Some(bucket) = &self.bucket {
            config = config.with_container(bucket.clone());
        }
        if let Some(region) = &self.region {
            config = config.with_region(region.clone());
        }
        if let Some(endpoint) = &self.endpoint_url {
            config = config.with_endpoint_url(endpoint.clone());
        }
        if let Some(prefix) = &self.prefix {
            config = config.with_key_prefix(prefix.clone());
        }
        if let Some(threshold) = self.threshold {
            config = config.with_size_threshold(threshold);
        }
        if let Some(part_size) = self.part_size {
            config = config.with_part_size(part_size);
        }

        config.validate()?;
        Ok(config)
    }
}
